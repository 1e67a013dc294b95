//! # Rangesync
//!
//! Responder core for range-checksum dataset reconciliation.
//!
//! A remote peer announces key ranges of a shared table together with the
//! checksum it computed over them. This core re-checksums the local copy,
//! subdivides on mismatch, and emits the envelopes that walk the peer down
//! to the individual rows it is missing.
//!
//! ## Message Flow
//!
//! ```text
//! Peer                                   Responder
//!   |---- checksum_fail [begin,end] ------->|
//!   |<--- integrity_check_left  (+tail) ----|   n >= 2: split in half
//!   |<--- integrity_check_right ------------|
//!   |---- checksum_fail [narrower] -------->|
//!   |         ...                           |
//!   |<--- state (row) ----------------------|   n == 1: the row itself,
//!   |<--- integrity_check_global -----------|   then a confirming check
//!   |                                       |
//!   |---- no_data ------------------------->|
//!   |<--- state x N (full dump) ------------|
//! ```
//!
//! ## Key Properties
//!
//! - **Stateless across frames**: each inbound frame yields one response
//!   volley; the peer drives the recursion
//! - **Deterministic**: the volley is a pure function of the dataset
//!   contents at processing time
//! - **Streaming**: checksums fold row by row, never materializing a range
//! - **Handle-isolated**: every handle has its own FIFO consumer task
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rangesync::SyncManager;
//! use rangesync_store::SqliteDataset;
//!
//! # fn config_json() -> String { String::new() }
//! # async fn example() -> rangesync::Result<()> {
//! let manager = SyncManager::new();
//! let handle = manager.create();
//!
//! let dataset = Arc::new(SqliteDataset::open("fim.db")?);
//! manager.register_sync_id(
//!     handle,
//!     "fim",
//!     dataset,
//!     &config_json(),
//!     Arc::new(|envelope| println!("{envelope}")),
//! )?;
//!
//! manager.push(handle, bytes::Bytes::from_static(
//!     br#"fim checksum_fail {"begin":"/etc","end":"/usr","id":1}"#,
//! ))?;
//!
//! manager.close(handle).await?;
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod responder;

pub mod error;
pub mod manager;
pub mod registry;

pub use error::{Result, SyncError};
pub use manager::{Handle, SyncManager};
pub use registry::{Registration, Registry};

pub use rangesync_core::config::SyncConfig;
pub use rangesync_core::messages::Sink;
pub use rangesync_store::{Dataset, DatasetError, MemoryDataset, Row, SqliteDataset};
