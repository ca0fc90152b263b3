//! Active-scope CRUD for [`GenericStore`]

use super::core::GenericStore;
use crate::errors::StoreError;
use crate::query_builder::QueryBuilder;
use crate::scope::QueryScope;
use crate::soft_delete::{BatchReport, DeleteOutcome};
use crate::traits::{StoreObject, TableMetadata};
use async_trait::async_trait;
use serde_json::Value;
use signal_system::EventType;
use tracing::debug;

#[async_trait]
impl<T> StoreObject for GenericStore<T>
where
    T: TableMetadata,
{
    type Model = T;
    type Id = T::Id;

    /// Insert the primary key (when set) and the create fields; new records are active
    async fn create(&self, data: Self::Model) -> Result<Self::Model, StoreError> {
        let schema = self.schema();
        let mut row = Self::to_row(&data, T::create_fields())?;

        let pk = Self::to_row(&data, &[schema.primary_key])?;
        if let Some(id) = pk.get(schema.primary_key).filter(|id| !id.is_null()) {
            row.insert(schema.primary_key.to_string(), id.clone());
        }
        row.insert(schema.soft_delete_field.to_string(), Value::Bool(true));

        let stored = self.backend().insert(&schema, row).await?;
        let created = Self::to_model(stored)?;
        debug!(table = schema.table, "record created");

        self.emit_record_event(EventType::Create, &created);
        Ok(created)
    }

    async fn get_by_id(&self, id: &Self::Id) -> Result<Option<Self::Model>, StoreError> {
        self.get_by_id_scoped(QueryScope::Active, id).await
    }

    async fn list_all(&self) -> Result<Vec<Self::Model>, StoreError> {
        self.read_scoped(QueryScope::Active, QueryBuilder::new()).await
    }

    /// Write the update fields of `data` to record `id`, whatever its flag
    async fn update(&self, id: &Self::Id, data: Self::Model) -> Result<Self::Model, StoreError> {
        let schema = self.schema();
        let changes = Self::to_row(&data, T::update_fields())?;
        let universal_id = Self::universal_id(id);

        let stored = self
            .backend()
            .update(&schema, &universal_id, changes)
            .await?
            .ok_or_else(|| StoreError::not_found(schema.table, &universal_id))?;
        let updated = Self::to_model(stored)?;

        self.emit_record_event(EventType::Update, &updated);
        Ok(updated)
    }

    async fn delete(&self, id: &Self::Id) -> Result<DeleteOutcome, StoreError> {
        self.engine
            .delete(T::table_name(), &Self::universal_id(id))
            .await
    }

    async fn delete_many(&self, ids: Vec<Self::Id>) -> Result<BatchReport<DeleteOutcome>, StoreError> {
        let ids: Vec<_> = ids.iter().map(Self::universal_id).collect();
        self.engine.delete_many(T::table_name(), &ids).await
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.count_scoped(QueryScope::Active, QueryBuilder::new()).await
    }

    async fn find(&self, query: QueryBuilder) -> Result<Vec<Self::Model>, StoreError> {
        self.read_scoped(QueryScope::Active, query).await
    }

    async fn find_one(&self, query: QueryBuilder) -> Result<Option<Self::Model>, StoreError> {
        let mut found = self.read_scoped(QueryScope::Active, query.limit(1)).await?;
        Ok(found.pop())
    }

    async fn delete_where(&self, query: QueryBuilder) -> Result<BatchReport<DeleteOutcome>, StoreError> {
        self.engine.delete_where(T::table_name(), query).await
    }

    async fn count_where(&self, query: QueryBuilder) -> Result<i64, StoreError> {
        self.count_scoped(QueryScope::Active, query).await
    }
}

impl<T: TableMetadata> GenericStore<T> {
    pub(crate) async fn read_scoped(
        &self,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let schema = self.schema();
        let rows = self.backend().fetch(&schema, &scope.apply(&schema, query)).await?;
        Self::to_models(rows)
    }

    pub(crate) async fn get_by_id_scoped(
        &self,
        scope: QueryScope,
        id: &T::Id,
    ) -> Result<Option<T>, StoreError> {
        let schema = self.schema();
        let query = QueryBuilder::new().filter(crate::query_builder::QueryFilter::eq(
            schema.primary_key,
            Self::universal_id(id).to_json(),
        ));
        let mut found = self.read_scoped(scope, query.limit(1)).await?;
        Ok(found.pop())
    }

    pub(crate) async fn count_scoped(
        &self,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<i64, StoreError> {
        let schema = self.schema();
        self.backend().count(&schema, &scope.apply(&schema, query)).await
    }
}
