//! Error types for dataset adapters.

use thiserror::Error;

/// Errors raised by a dataset adapter.
///
/// These abort only the in-flight reconciliation operation; the handle that
/// issued the query stays healthy.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The underlying store rejected the query.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The query produced rows of an unexpected shape.
    #[error("unexpected result shape: {0}")]
    UnexpectedShape(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("connection mutex poisoned")]
    Poisoned,

    /// A blocking task could not be joined.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
