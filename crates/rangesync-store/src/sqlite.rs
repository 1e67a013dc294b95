//! SQLite implementation of the Dataset trait.
//!
//! Executes the registration's SELECT templates against a rusqlite
//! connection (bundled SQLite). Scalar lookups hop to `spawn_blocking`;
//! row streaming runs on the consumer task so visitors can borrow engine
//! state while rows are folded one at a time.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Number, Value};

use rangesync_core::config::SelectQuery;

use crate::error::{DatasetError, Result};
use crate::traits::{Dataset, Row, RowVisitor};

/// SQLite-backed dataset adapter.
///
/// Thread-safe via an internal connection mutex.
pub struct SqliteDataset {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDataset {
    /// Open a database file, creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(Connection::open(path)?)),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        })
    }

    /// Run a raw SQL batch. Intended for schema setup and test fixtures.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DatasetError::Poisoned)
    }

    fn scan(&self, sql: &str, visit: RowVisitor<'_>) -> Result<()> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            if !visit(row_to_json(row)?) {
                break;
            }
        }
        Ok(())
    }
}

fn row_to_json(row: &rusqlite::Row<'_>) -> Result<Row> {
    let stmt = row.as_ref();
    let mut out = Row::new();
    for index in 0..stmt.column_count() {
        let name = stmt.column_name(index)?.to_string();
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::from(v),
            ValueRef::Real(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
            ValueRef::Text(v) => Value::from(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::from(hex::encode(v)),
        };
        out.insert(name, value);
    }
    Ok(out)
}

#[async_trait]
impl Dataset for SqliteDataset {
    async fn count_range(
        &self,
        query: &SelectQuery,
        count_field: &str,
        begin: &str,
        end: &str,
    ) -> Result<u64> {
        let sql = query.to_sql(&[begin, end]);
        let count_field = count_field.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| DatasetError::Poisoned)?;
            let mut stmt = conn.prepare(&sql)?;
            let count: i64 = stmt.query_row([], |row| row.get(count_field.as_str()))?;
            Ok(count.max(0) as u64)
        })
        .await
        .map_err(|e| DatasetError::Task(e.to_string()))?
    }

    async fn row_by_index(&self, query: &SelectQuery, key: &str) -> Result<Option<Row>> {
        let sql = query.to_sql(&[key]);
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| DatasetError::Poisoned)?;
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_json(row)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| DatasetError::Task(e.to_string()))?
    }

    async fn for_each_range(
        &self,
        query: &SelectQuery,
        begin: &str,
        end: &str,
        visit: RowVisitor<'_>,
    ) -> Result<()> {
        self.scan(&query.to_sql(&[begin, end]), visit)
    }

    async fn for_each(&self, query: &SelectQuery, visit: RowVisitor<'_>) -> Result<()> {
        self.scan(&query.to_sql(&[]), visit)
    }
}
