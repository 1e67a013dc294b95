//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while validating a registration configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration is not valid JSON or misses a required field.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `decoder_type` names a decoder this build does not recognize.
    #[error("unrecognized decoder type: {0:?}")]
    UnknownDecoder(String),
}

/// Errors raised while decoding an inbound frame.
///
/// These are consumer-side: the dispatcher logs the frame and drops it.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame is not valid UTF-8.
    #[error("frame is not UTF-8")]
    NotUtf8,

    /// Frame does not have the `<sync_id> <op> <json>` shape.
    #[error("malformed frame: {0}")]
    BadFrame(&'static str),

    /// Operation token is not a known operation.
    #[error("unknown operation: {0:?}")]
    UnknownOp(String),

    /// JSON body failed to parse or misses `begin`, `end`, or `id`.
    #[error("malformed frame body: {0}")]
    BadBody(#[from] serde_json::Error),
}
