use super::core::StoreObject;
use crate::errors::StoreError;
use crate::id_type::UniversalId;
use crate::query_builder::QueryBuilder;
use crate::scope::QueryScope;
use crate::soft_delete::BatchReport;
use async_trait::async_trait;

/// Scoped reads, restore and physical removal
#[async_trait]
pub trait SoftDeletable: StoreObject {
    async fn read(
        &self,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<Vec<Self::Model>, StoreError>;

    async fn get_by_id_in(
        &self,
        scope: QueryScope,
        id: &Self::Id,
    ) -> Result<Option<Self::Model>, StoreError>;

    async fn list_inactive(&self) -> Result<Vec<Self::Model>, StoreError>;

    /// Active and soft-deleted records alike
    async fn list_with_inactive(&self) -> Result<Vec<Self::Model>, StoreError>;

    async fn count_in(&self, scope: QueryScope, query: QueryBuilder) -> Result<i64, StoreError>;

    /// Reactivate one record; its former dependents stay as they are
    async fn restore(&self, id: &Self::Id) -> Result<(), StoreError>;

    /// Physically remove the row, skipping the flag flip and cascade evaluation
    async fn hard_delete(&self, id: &Self::Id) -> Result<(), StoreError>;

    async fn hard_delete_many(
        &self,
        ids: Vec<Self::Id>,
    ) -> Result<BatchReport<UniversalId>, StoreError>;

    async fn hard_delete_where(
        &self,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<BatchReport<UniversalId>, StoreError>;
}
