//! Storage boundary
//!
//! The soft-delete engine and the typed stores talk to storage only through
//! these traits. Rows travel as JSON objects so one engine serves every table.

pub mod memory;
pub mod postgres;

use crate::errors::StoreError;
use crate::id_type::UniversalId;
use crate::query_builder::QueryBuilder;
use crate::relation::Relation;
use crate::schema::TableSchema;
use crate::scope::QueryScope;
use async_trait::async_trait;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

/// A record as a JSON object keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Non-transactional reads and single-row writes
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Open a unit of work; it is released when committed, rolled back or dropped
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StoreError>;

    /// Rows matching `query` exactly as given (scope must already be applied)
    async fn fetch(&self, schema: &TableSchema, query: &QueryBuilder) -> Result<Vec<Row>, StoreError>;

    async fn count(&self, schema: &TableSchema, query: &QueryBuilder) -> Result<i64, StoreError>;

    /// Insert one row and return it as stored, defaults included
    async fn insert(&self, schema: &TableSchema, row: Row) -> Result<Row, StoreError>;

    /// Apply `changes` to record `id`; `None` when it does not exist
    async fn update(
        &self,
        schema: &TableSchema,
        id: &UniversalId,
        changes: Row,
    ) -> Result<Option<Row>, StoreError>;
}

/// Writes that must commit or roll back together
#[async_trait]
pub trait StorageTransaction: Send {
    /// Soft-delete flag of record `id`, locking it for the rest of the transaction
    async fn record_state(
        &mut self,
        schema: &TableSchema,
        id: &UniversalId,
    ) -> Result<Option<bool>, StoreError>;

    /// Ids of `dependent` rows whose `relation.foreign_key` points at `parent_id`
    async fn dependents(
        &mut self,
        relation: &Relation,
        dependent: &TableSchema,
        parent_id: &UniversalId,
        scope: QueryScope,
    ) -> Result<Vec<UniversalId>, StoreError>;

    async fn set_active(
        &mut self,
        schema: &TableSchema,
        ids: &[UniversalId],
        active: bool,
    ) -> Result<u64, StoreError>;

    async fn clear_foreign_key(
        &mut self,
        schema: &TableSchema,
        foreign_key: &str,
        ids: &[UniversalId],
    ) -> Result<u64, StoreError>;

    /// Physically delete rows
    async fn remove(&mut self, schema: &TableSchema, ids: &[UniversalId]) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Primary key of a row, if it has a usable one
pub fn row_id(schema: &TableSchema, row: &Row) -> Option<UniversalId> {
    row.get(schema.primary_key).and_then(UniversalId::from_json)
}
