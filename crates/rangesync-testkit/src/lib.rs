//! # Rangesync Testkit
//!
//! Testing utilities for the rangesync workspace:
//!
//! - **Catalog fixture**: a five-row file catalog with known per-row
//!   checksums, available as a seeded SQLite dataset or an in-memory one
//! - **Configuration builders**: ready-made registration documents for the
//!   fixture table
//! - **[`CollectingSink`]**: a sink that records every outbound envelope
//!   and lets tests await their arrival

pub mod fixtures;
pub mod sink;

pub use fixtures::{
    broken_filter_config, catalog_config, catalog_config_for, catalog_memory, catalog_sqlite,
    CATALOG_SQL,
};
pub use sink::CollectingSink;
