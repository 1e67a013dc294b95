//! # Rangesync Store
//!
//! Dataset adapters: typed access to the ordered, indexed table a
//! registration synchronizes.
//!
//! ## Overview
//!
//! The reconciliation engine is storage-agnostic behind the [`Dataset`]
//! trait. The primary implementation is [`SqliteDataset`], which executes
//! the registration's configured SELECT templates against a rusqlite
//! connection; [`MemoryDataset`] backs unit tests.
//!
//! ## Key Types
//!
//! - [`Dataset`] - the async adapter trait
//! - [`Row`] - one table row as a name-addressable JSON map
//! - [`SqliteDataset`] - SQLite-backed adapter (bundled SQLite)
//! - [`MemoryDataset`] - in-memory adapter for tests

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use error::{DatasetError, Result};
pub use memory::MemoryDataset;
pub use sqlite::SqliteDataset;
pub use traits::{Dataset, Row, RowVisitor};
