//! Storage session interface and its implementations.

mod memory;
mod postgres;
mod query;
mod record;

pub use memory::MemorySession;
pub use postgres::{ent_schema, PgSession};
pub use query::*;
pub use record::Record;

use crate::config::StorageTable;
use crate::error::EntError;
use async_trait::async_trait;
use uuid::Uuid;

/// Unit of work every generated operation runs against. Transactions and
/// concurrency control belong to the implementation.
#[async_trait]
pub trait Session: Send + Sync {
    async fn fetch_by_id(&self, table: &StorageTable, id: Uuid) -> Result<Option<Record>, EntError>;

    async fn insert(&self, table: &StorageTable, record: &Record) -> Result<(), EntError>;

    /// Write `changes` (a subset of columns) to the row `id`.
    async fn update(&self, table: &StorageTable, id: Uuid, changes: &Record) -> Result<(), EntError>;

    async fn delete(&self, table: &StorageTable, id: Uuid) -> Result<(), EntError>;

    /// Rows of the query's source.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, EntError>;

    /// Number of matching rows; ordering and paging are ignored.
    async fn count(&self, query: &SelectQuery) -> Result<Option<i64>, EntError>;
}
