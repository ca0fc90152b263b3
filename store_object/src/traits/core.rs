use crate::errors::StoreError;
use crate::query_builder::QueryBuilder;
use crate::soft_delete::{BatchReport, DeleteOutcome};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Typed CRUD over one table
///
/// Every read here uses the active scope; `delete` is a soft delete that honors
/// the declared on-delete policies of dependent tables.
#[async_trait]
pub trait StoreObject: Clone + Send + Sync + Debug {
    type Model: Clone + Send + Sync + Debug + Serialize + DeserializeOwned;

    type Id: Clone + Send + Sync + Debug;

    async fn create(&self, data: Self::Model) -> Result<Self::Model, StoreError>;

    /// Active record by id; soft-deleted records read as `None`
    async fn get_by_id(&self, id: &Self::Id) -> Result<Option<Self::Model>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Self::Model>, StoreError>;

    /// Write the model's update fields to record `id`
    async fn update(&self, id: &Self::Id, data: Self::Model) -> Result<Self::Model, StoreError>;

    async fn delete(&self, id: &Self::Id) -> Result<DeleteOutcome, StoreError>;

    /// One independent soft delete per id
    async fn delete_many(&self, ids: Vec<Self::Id>) -> Result<BatchReport<DeleteOutcome>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    async fn find(&self, query: QueryBuilder) -> Result<Vec<Self::Model>, StoreError>;

    async fn find_one(&self, query: QueryBuilder) -> Result<Option<Self::Model>, StoreError>;

    /// Soft delete every active record matched by `query`, one transaction each
    async fn delete_where(&self, query: QueryBuilder) -> Result<BatchReport<DeleteOutcome>, StoreError>;

    async fn count_where(&self, query: QueryBuilder) -> Result<i64, StoreError>;
}
