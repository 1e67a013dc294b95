//! # Rangesync Core
//!
//! Shared types for the rangesync responder: the inbound frame codec, the
//! outbound wire envelopes, the registration configuration schema, and the
//! streaming range hasher.
//!
//! ## Overview
//!
//! A peer that detects a divergent key range sends a text frame
//! `<sync_id> <op> <json>`. This crate decodes such frames into
//! [`SyncInput`] values and formats the response envelopes
//! (`integrity_check_left`, `integrity_check_right`,
//! `integrity_check_global`, `integrity_clear`, `state`) as compact JSON
//! strings handed to the registered [`Sink`].
//!
//! ## Key Types
//!
//! - [`SyncInput`] / [`SyncOp`] - a decoded inbound frame
//! - [`SyncConfig`] - the per-registration query configuration
//! - [`RangeDigest`] / [`IntegrityKind`] - one integrity envelope's payload
//! - [`RangeHasher`] - incremental SHA-256 over a range's checksum column

pub mod checksum;
pub mod codec;
pub mod config;
pub mod error;
pub mod messages;

pub use checksum::RangeHasher;
pub use codec::{decode_frame, SyncInput, SyncOp};
pub use config::{DecoderType, QueryTemplate, SelectQuery, SyncConfig};
pub use error::{ConfigError, DecodeError};
pub use messages::{integrity_envelope, state_envelope, IntegrityKind, RangeDigest, Sink};
