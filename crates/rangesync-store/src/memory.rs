//! In-memory implementation of the Dataset trait.
//!
//! Primarily for tests. Rows are kept ordered by the index column's string
//! value, matching the visiting order of the SQLite adapter; SELECT
//! templates are accepted but not interpreted.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use rangesync_core::config::SelectQuery;

use crate::error::{DatasetError, Result};
use crate::traits::{Dataset, Row, RowVisitor};

/// In-memory dataset ordered by one index column.
pub struct MemoryDataset {
    index_column: String,
    rows: RwLock<BTreeMap<String, Row>>,
}

impl MemoryDataset {
    /// Create an empty dataset keyed by `index_column`.
    pub fn new(index_column: impl Into<String>) -> Self {
        Self {
            index_column: index_column.into(),
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or replace one row. The row must carry the index column.
    pub fn insert(&self, row: Row) -> Result<()> {
        let key = match row.get(&self.index_column) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(DatasetError::UnexpectedShape(format!(
                    "row is missing index column {:?}",
                    self.index_column
                )))
            }
        };
        self.rows.write().unwrap().insert(key, row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Dataset for MemoryDataset {
    async fn count_range(
        &self,
        _query: &SelectQuery,
        _count_field: &str,
        begin: &str,
        end: &str,
    ) -> Result<u64> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .range::<str, _>((Bound::Included(begin), Bound::Included(end)))
            .count() as u64)
    }

    async fn row_by_index(&self, _query: &SelectQuery, key: &str) -> Result<Option<Row>> {
        Ok(self.rows.read().unwrap().get(key).cloned())
    }

    async fn for_each_range(
        &self,
        _query: &SelectQuery,
        begin: &str,
        end: &str,
        visit: RowVisitor<'_>,
    ) -> Result<()> {
        let rows = self.rows.read().unwrap();
        for (_, row) in rows.range::<str, _>((Bound::Included(begin), Bound::Included(end))) {
            if !visit(row.clone()) {
                break;
            }
        }
        Ok(())
    }

    async fn for_each(&self, _query: &SelectQuery, visit: RowVisitor<'_>) -> Result<()> {
        let rows = self.rows.read().unwrap();
        for row in rows.values() {
            if !visit(row.clone()) {
                break;
            }
        }
        Ok(())
    }
}
