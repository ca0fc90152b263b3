//! Scoped reads, restore and hard delete for [`GenericStore`]

use super::core::GenericStore;
use crate::errors::StoreError;
use crate::id_type::UniversalId;
use crate::query_builder::QueryBuilder;
use crate::scope::QueryScope;
use crate::soft_delete::BatchReport;
use crate::traits::{SoftDeletable, TableMetadata};
use async_trait::async_trait;

#[async_trait]
impl<T> SoftDeletable for GenericStore<T>
where
    T: TableMetadata,
{
    async fn read(
        &self,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<Vec<Self::Model>, StoreError> {
        self.read_scoped(scope, query).await
    }

    async fn get_by_id_in(
        &self,
        scope: QueryScope,
        id: &Self::Id,
    ) -> Result<Option<Self::Model>, StoreError> {
        self.get_by_id_scoped(scope, id).await
    }

    async fn list_inactive(&self) -> Result<Vec<Self::Model>, StoreError> {
        self.read_scoped(QueryScope::Inactive, QueryBuilder::new()).await
    }

    async fn list_with_inactive(&self) -> Result<Vec<Self::Model>, StoreError> {
        self.read_scoped(QueryScope::All, QueryBuilder::new()).await
    }

    async fn count_in(&self, scope: QueryScope, query: QueryBuilder) -> Result<i64, StoreError> {
        self.count_scoped(scope, query).await
    }

    async fn restore(&self, id: &Self::Id) -> Result<(), StoreError> {
        self.engine
            .restore(T::table_name(), &Self::universal_id(id))
            .await
    }

    async fn hard_delete(&self, id: &Self::Id) -> Result<(), StoreError> {
        self.engine
            .hard_delete(T::table_name(), &Self::universal_id(id))
            .await
    }

    async fn hard_delete_many(
        &self,
        ids: Vec<Self::Id>,
    ) -> Result<BatchReport<UniversalId>, StoreError> {
        let ids: Vec<_> = ids.iter().map(Self::universal_id).collect();
        self.engine.hard_delete_many(T::table_name(), &ids).await
    }

    async fn hard_delete_where(
        &self,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<BatchReport<UniversalId>, StoreError> {
        self.engine
            .hard_delete_where(T::table_name(), scope, query)
            .await
    }
}
