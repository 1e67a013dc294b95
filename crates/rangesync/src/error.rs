//! Error types for the synchronization facade.
//!
//! Boundary errors (`InvalidArgument`, `Config`) surface to the caller of
//! the control-surface method. Everything else is discovered on a handle's
//! consumer task after `push` has already returned, so it is only
//! observable through the logs.

use thiserror::Error;

use rangesync_core::error::{ConfigError, DecodeError};
use rangesync_store::DatasetError;

/// Facade error type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Empty or unusable input at the API boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Registration configuration failed schema validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Inbound frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The dataset backend rejected a query.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Frame addressed a sync id with no registration on its handle.
    #[error("no registration for sync id {0:?}")]
    UnknownSyncId(String),

    /// A row lacked a column the configuration references.
    #[error("row is missing configured column {0:?}")]
    MissingColumn(String),

    /// The row stream did not match the counted range size.
    #[error("range produced {got} rows, expected {expected}")]
    RangeSizeMismatch { expected: u64, got: u64 },
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, SyncError>;
