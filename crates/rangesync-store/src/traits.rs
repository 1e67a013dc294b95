//! Dataset trait: the abstract interface the reconciliation engine queries.
//!
//! Implementations must yield rows in ascending order of the table's index
//! column; the engine's checksums and split boundaries depend on it.

use async_trait::async_trait;
use serde_json::{Map, Value};

use rangesync_core::config::SelectQuery;

use crate::error::Result;

/// One table row, addressable by column name. Values keep the JSON type the
/// backend produced: integers stay numbers, text stays strings. The wire
/// format echoes them as-is.
pub type Row = Map<String, Value>;

/// Visitor invoked once per row, in ascending index order. Return `false`
/// to stop the iteration early; the adapter yields no further rows.
pub type RowVisitor<'a> = &'a mut (dyn FnMut(Row) -> bool + Send);

/// Async adapter over one synchronized table.
///
/// Queries arrive as the registration's [`SelectQuery`] templates; range and
/// key bounds are passed separately so non-SQL backends can apply them
/// without interpreting the filter text. Adapters must be safe for calls
/// from one consumer task at a time per handle, with handles on distinct
/// tasks calling concurrently.
#[async_trait]
pub trait Dataset: Send + Sync {
    /// Execute the count template bound to `[begin, end]` and return the
    /// scalar published under `count_field`.
    async fn count_range(
        &self,
        query: &SelectQuery,
        count_field: &str,
        begin: &str,
        end: &str,
    ) -> Result<u64>;

    /// Fetch the single row whose index column equals `key`.
    async fn row_by_index(&self, query: &SelectQuery, key: &str) -> Result<Option<Row>>;

    /// Stream the rows of `[begin, end]` in ascending index order.
    async fn for_each_range(
        &self,
        query: &SelectQuery,
        begin: &str,
        end: &str,
        visit: RowVisitor<'_>,
    ) -> Result<()>;

    /// Stream every row of the table in ascending index order.
    async fn for_each(&self, query: &SelectQuery, visit: RowVisitor<'_>) -> Result<()>;
}
