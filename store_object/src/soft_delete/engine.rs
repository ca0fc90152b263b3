use super::outcome::{BatchReport, DeleteOutcome, Nullified, ProtectedDependent, RecordRef};
use super::plan::DeletePlan;
use crate::backend::{row_id, StorageBackend, StorageTransaction};
use crate::errors::StoreError;
use crate::id_type::UniversalId;
use crate::query_builder::QueryBuilder;
use crate::relation::OnDelete;
use crate::schema::{RelationRegistry, SharedRegistry, TableSchema};
use crate::scope::QueryScope;
use config::SoftDeleteConfig;
use signal_system::{DatabaseEvent, EventType, PostgresValue, SignalManager};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies on-delete policies across every registered table
///
/// Cheap to clone; all clones share the backend, the registry and the signal
/// manager.
#[derive(Clone)]
pub struct SoftDeleteEngine {
    backend: Arc<dyn StorageBackend>,
    registry: SharedRegistry,
    signals: Option<Arc<SignalManager>>,
    config: SoftDeleteConfig,
}

impl fmt::Debug for SoftDeleteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftDeleteEngine")
            .field("backend", &self.backend)
            .field("signals", &self.signals.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl SoftDeleteEngine {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        registry: SharedRegistry,
        config: SoftDeleteConfig,
    ) -> Self {
        Self {
            backend,
            registry,
            signals: None,
            config,
        }
    }

    pub fn with_signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.signals.as_ref()
    }

    pub fn config(&self) -> &SoftDeleteConfig {
        &self.config
    }

    fn protect_scope(&self) -> QueryScope {
        if self.config.protect_counts_inactive {
            QueryScope::All
        } else {
            QueryScope::Active
        }
    }

    /// Soft delete one record and everything its relations cascade to
    ///
    /// Deleting a record that is already inactive succeeds without changing
    /// anything or emitting events.
    pub async fn delete(&self, table: &str, id: &UniversalId) -> Result<DeleteOutcome, StoreError> {
        let registry = self.registry.snapshot()?;
        let schema = *registry.schema(table)?;

        let mut tx = self.backend.begin().await?;
        let result = self.delete_in(&registry, &schema, id, tx.as_mut()).await;
        let (outcome, changed) = self.finish(tx, result, schema.table).await?;

        if changed {
            info!(
                table = schema.table,
                id = %id,
                cascaded = outcome.deactivated.len(),
                nullified = outcome.nullified.len(),
                "soft delete committed"
            );
            self.emit_delete(&outcome);
        } else {
            debug!(table = schema.table, id = %id, "record already inactive");
        }
        Ok(outcome)
    }

    async fn delete_in(
        &self,
        registry: &RelationRegistry,
        schema: &TableSchema,
        id: &UniversalId,
        tx: &mut dyn StorageTransaction,
    ) -> Result<(DeleteOutcome, bool), StoreError> {
        let root = RecordRef::new(schema.table, id.clone());
        let active = tx
            .record_state(schema, id)
            .await?
            .ok_or_else(|| StoreError::not_found(schema.table, id))?;

        if !active {
            let outcome = DeleteOutcome {
                root,
                deactivated: Vec::new(),
                nullified: Vec::new(),
            };
            return Ok((outcome, false));
        }

        let plan = DeletePlan::build(registry, schema, id, tx, self.protect_scope()).await?;
        debug!(
            table = schema.table,
            id = %id,
            cascaded = plan.deactivate.values().map(|(_, ids)| ids.len()).sum::<usize>(),
            nullified = plan.nullify.iter().map(|n| n.ids.len()).sum::<usize>(),
            blockers = plan.blockers.len(),
            "delete plan built"
        );

        if !plan.blockers.is_empty() {
            warn!(
                table = schema.table,
                id = %id,
                blockers = plan.blockers.len(),
                "soft delete refused by protected dependents"
            );
            return Err(StoreError::HasProtectedDependents {
                table: schema.table.to_string(),
                id: id.to_string(),
                dependents: plan.blockers,
            });
        }

        let mut nullified = Vec::new();
        for nullification in &plan.nullify {
            tx.clear_foreign_key(&nullification.schema, nullification.foreign_key, &nullification.ids)
                .await?;
            nullified.extend(nullification.ids.iter().map(|dependent_id| Nullified {
                table: nullification.schema.table,
                foreign_key: nullification.foreign_key,
                id: dependent_id.clone(),
            }));
        }

        for (dependent, ids) in plan.deactivate.values() {
            tx.set_active(dependent, ids, false).await?;
        }
        tx.set_active(schema, std::slice::from_ref(id), false).await?;

        let outcome = DeleteOutcome {
            root,
            deactivated: plan.cascaded(),
            nullified,
        };
        Ok((outcome, true))
    }

    /// Soft delete each id in its own transaction
    ///
    /// Only an unregistered table fails the call as a whole.
    pub async fn delete_many(
        &self,
        table: &str,
        ids: &[UniversalId],
    ) -> Result<BatchReport<DeleteOutcome>, StoreError> {
        self.registry.snapshot()?.schema(table)?;

        let mut report = BatchReport::new();
        for id in ids {
            report.record(id.clone(), self.delete(table, id).await);
        }
        Ok(report)
    }

    /// Soft delete every active record matching `query`
    pub async fn delete_where(
        &self,
        table: &str,
        query: QueryBuilder,
    ) -> Result<BatchReport<DeleteOutcome>, StoreError> {
        let ids = self.matching_ids(table, QueryScope::Active, query).await?;
        self.delete_many(table, &ids).await
    }

    /// Flip a record back to active; dependents deactivated with it stay inactive
    pub async fn restore(&self, table: &str, id: &UniversalId) -> Result<(), StoreError> {
        let registry = self.registry.snapshot()?;
        let schema = *registry.schema(table)?;

        let mut tx = self.backend.begin().await?;
        let result = Self::restore_in(&schema, id, tx.as_mut()).await;
        let changed = self.finish(tx, result, schema.table).await?;

        if changed {
            info!(table = schema.table, id = %id, "record restored");
            self.emit(DatabaseEvent::new(EventType::Restore, schema.table).with_record_id(id.to_string()));
        }
        Ok(())
    }

    async fn restore_in(
        schema: &TableSchema,
        id: &UniversalId,
        tx: &mut dyn StorageTransaction,
    ) -> Result<bool, StoreError> {
        let active = tx
            .record_state(schema, id)
            .await?
            .ok_or_else(|| StoreError::not_found(schema.table, id))?;
        if active {
            return Ok(false);
        }
        tx.set_active(schema, std::slice::from_ref(id), true).await?;
        Ok(true)
    }

    /// Physically remove one record, active or not
    ///
    /// Protect relations still refuse the removal. Cascade and set-null
    /// relations are not evaluated; storage-level foreign key actions apply.
    pub async fn hard_delete(&self, table: &str, id: &UniversalId) -> Result<(), StoreError> {
        let registry = self.registry.snapshot()?;
        let schema = *registry.schema(table)?;

        let mut tx = self.backend.begin().await?;
        let result = self.hard_delete_in(&registry, &schema, id, tx.as_mut()).await;
        self.finish(tx, result, schema.table).await?;

        info!(table = schema.table, id = %id, "record hard deleted");
        self.emit(DatabaseEvent::new(EventType::HardDelete, schema.table).with_record_id(id.to_string()));
        Ok(())
    }

    async fn hard_delete_in(
        &self,
        registry: &RelationRegistry,
        schema: &TableSchema,
        id: &UniversalId,
        tx: &mut dyn StorageTransaction,
    ) -> Result<(), StoreError> {
        tx.record_state(schema, id)
            .await?
            .ok_or_else(|| StoreError::not_found(schema.table, id))?;

        let mut blockers = Vec::new();
        for (relation, dependent) in registry.dependents_of(schema.table) {
            if relation.on_delete != OnDelete::Protect {
                continue;
            }
            let ids = tx
                .dependents(relation, &dependent, id, self.protect_scope())
                .await?;
            blockers.extend(ids.into_iter().map(|dependent_id| ProtectedDependent {
                table: dependent.table,
                foreign_key: relation.foreign_key,
                id: dependent_id,
                protects_table: schema.table,
                protects_id: id.clone(),
            }));
        }

        if !blockers.is_empty() {
            warn!(
                table = schema.table,
                id = %id,
                blockers = blockers.len(),
                "hard delete refused by protected dependents"
            );
            return Err(StoreError::HasProtectedDependents {
                table: schema.table.to_string(),
                id: id.to_string(),
                dependents: blockers,
            });
        }

        tx.remove(schema, std::slice::from_ref(id)).await?;
        Ok(())
    }

    pub async fn hard_delete_many(
        &self,
        table: &str,
        ids: &[UniversalId],
    ) -> Result<BatchReport<UniversalId>, StoreError> {
        self.registry.snapshot()?.schema(table)?;

        let mut report = BatchReport::new();
        for id in ids {
            let result = self.hard_delete(table, id).await.map(|()| id.clone());
            report.record(id.clone(), result);
        }
        Ok(report)
    }

    /// Hard delete every record of `table` in `scope` matching `query`
    pub async fn hard_delete_where(
        &self,
        table: &str,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<BatchReport<UniversalId>, StoreError> {
        let ids = self.matching_ids(table, scope, query).await?;
        self.hard_delete_many(table, &ids).await
    }

    async fn matching_ids(
        &self,
        table: &str,
        scope: QueryScope,
        query: QueryBuilder,
    ) -> Result<Vec<UniversalId>, StoreError> {
        let registry = self.registry.snapshot()?;
        let schema = *registry.schema(table)?;
        let rows = self.backend.fetch(&schema, &scope.apply(&schema, query)).await?;
        Ok(rows.iter().filter_map(|row| row_id(&schema, row)).collect())
    }

    /// Commit on success, roll back on failure, and hand the result through
    async fn finish<T: Send>(
        &self,
        tx: Box<dyn StorageTransaction>,
        result: Result<T, StoreError>,
        table: &str,
    ) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(table, error = %rollback_error, "rollback failed");
                }
                Err(error)
            }
        }
    }

    fn emit(&self, event: DatabaseEvent) {
        if let Some(signals) = &self.signals {
            signals.emit(event);
        }
    }

    /// One event per changed record, root last
    fn emit_delete(&self, outcome: &DeleteOutcome) {
        if self.signals.is_none() {
            return;
        }
        let cascade_root = outcome.root.to_string();

        for record in &outcome.nullified {
            self.emit(
                DatabaseEvent::new(EventType::Update, record.table)
                    .with_record_id(record.id.to_string())
                    .with_payload(record.foreign_key, PostgresValue::Null)
                    .with_payload("cascade_root", cascade_root.clone()),
            );
        }
        for record in &outcome.deactivated {
            self.emit(
                DatabaseEvent::new(EventType::SoftDelete, record.table)
                    .with_record_id(record.id.to_string())
                    .with_payload("cascade_root", cascade_root.clone()),
            );
        }
        self.emit(
            DatabaseEvent::new(EventType::SoftDelete, outcome.root.table)
                .with_record_id(outcome.root.id.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Row};
    use crate::query_builder::QueryFilter;
    use crate::relation::Relation;
    use config::SignalConfig;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    const CATEGORY_RELATIONS: &[Relation] =
        &[Relation::new("categories", "parent_id", "categories", OnDelete::Cascade)];
    const PRODUCT_RELATIONS: &[Relation] =
        &[Relation::new("products", "category_id", "categories", OnDelete::Cascade)];
    const ITEM_RELATIONS: &[Relation] = &[
        Relation::new("order_items", "order_id", "orders", OnDelete::Cascade),
        Relation::new("order_items", "product_id", "products", OnDelete::Protect),
    ];
    const PROMO_RELATIONS: &[Relation] =
        &[Relation::new("banners", "product_id", "products", OnDelete::SetNull)];
    const NOTE_RELATIONS: &[Relation] =
        &[Relation::new("notes", "product_id", "products", OnDelete::Ignore)];

    const CATEGORIES: TableSchema = TableSchema::new("categories", "id", "is_active", CATEGORY_RELATIONS);
    const PRODUCTS: TableSchema = TableSchema::new("products", "id", "is_active", PRODUCT_RELATIONS);
    const ORDERS: TableSchema = TableSchema::new("orders", "id", "is_active", &[]);
    const ITEMS: TableSchema = TableSchema::new("order_items", "id", "is_active", ITEM_RELATIONS);
    const BANNERS: TableSchema = TableSchema::new("banners", "id", "is_active", PROMO_RELATIONS);
    const NOTES: TableSchema = TableSchema::new("notes", "id", "is_active", NOTE_RELATIONS);

    fn id(value: i64) -> UniversalId {
        UniversalId::Numeric(value)
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    struct Fixture {
        backend: MemoryBackend,
        engine: SoftDeleteEngine,
        events: Arc<Mutex<Vec<DatabaseEvent>>>,
    }

    impl Fixture {
        fn new(config: SoftDeleteConfig) -> Self {
            let mut registry = RelationRegistry::new();
            for schema in [CATEGORIES, PRODUCTS, ORDERS, ITEMS, BANNERS, NOTES] {
                registry.register_schema(schema).unwrap();
            }
            registry.validate().unwrap();

            let backend = MemoryBackend::new();
            let signals = Arc::new(SignalManager::new(SignalConfig::default()));
            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            signals
                .add_callback(move |event: &DatabaseEvent| {
                    sink.lock().unwrap().push(event.clone());
                    Ok(())
                })
                .unwrap();

            let engine = SoftDeleteEngine::new(
                Arc::new(backend.clone()),
                SharedRegistry::new(registry),
                config,
            )
            .with_signals(signals);

            Self {
                backend,
                engine,
                events,
            }
        }

        async fn insert(&self, schema: &TableSchema, value: Value) {
            self.backend.insert(schema, row(value)).await.unwrap();
        }

        async fn is_active(&self, table: &str, record: i64) -> bool {
            self.backend.raw_row(table, &id(record)).await.unwrap()["is_active"] == json!(true)
        }

        async fn field(&self, table: &str, record: i64, field: &str) -> Value {
            self.backend.raw_row(table, &id(record)).await.unwrap()[field].clone()
        }

        fn events(&self) -> Vec<DatabaseEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_cascade_deactivates_whole_subtree() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&CATEGORIES, json!({"id": 1, "title": "Shoes"})).await;
        fx.insert(&CATEGORIES, json!({"id": 2, "title": "Boots", "parent_id": 1})).await;
        fx.insert(&CATEGORIES, json!({"id": 3, "title": "Hats"})).await;
        fx.insert(&PRODUCTS, json!({"id": 10, "category_id": 2})).await;
        fx.insert(&PRODUCTS, json!({"id": 11, "category_id": 1})).await;
        fx.insert(&PRODUCTS, json!({"id": 12, "category_id": 3})).await;

        let outcome = fx.engine.delete("categories", &id(1)).await.unwrap();

        assert!(!fx.is_active("categories", 1).await);
        assert!(!fx.is_active("categories", 2).await);
        assert!(!fx.is_active("products", 10).await);
        assert!(!fx.is_active("products", 11).await);
        assert!(fx.is_active("categories", 3).await);
        assert!(fx.is_active("products", 12).await);
        assert_eq!(outcome.deactivated.len(), 3);
        assert!(outcome.was_deactivated("products", &id(10)));

        let events = fx.events();
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.event_type == EventType::SoftDelete));
        let root = events.last().unwrap();
        assert_eq!(root.record_id.as_deref(), Some("1"));
        assert!(root.cascade_root().is_none());
        assert!(events[..3]
            .iter()
            .all(|e| e.cascade_root() == Some("categories:1")));
    }

    #[tokio::test]
    async fn test_protect_blocks_and_leaves_state_untouched() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&CATEGORIES, json!({"id": 1})).await;
        fx.insert(&PRODUCTS, json!({"id": 10, "category_id": 1})).await;
        fx.insert(&ORDERS, json!({"id": 100})).await;
        fx.insert(&ITEMS, json!({"id": 1000, "order_id": 100, "product_id": 10})).await;
        fx.insert(&BANNERS, json!({"id": 5, "product_id": 10})).await;

        let error = fx.engine.delete("categories", &id(1)).await.unwrap_err();

        let blockers = error.protected_dependents().unwrap();
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].table, "order_items");
        assert_eq!(blockers[0].id, id(1000));
        assert_eq!(blockers[0].protects_table, "products");
        assert_eq!(blockers[0].protects_id, id(10));

        assert!(fx.is_active("categories", 1).await);
        assert!(fx.is_active("products", 10).await);
        assert_eq!(fx.field("banners", 5, "product_id").await, json!(10));
        assert!(fx.events().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_protected_dependent_blocks_by_default() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&PRODUCTS, json!({"id": 10})).await;
        fx.insert(&ORDERS, json!({"id": 100})).await;
        fx.insert(&ITEMS, json!({"id": 1000, "order_id": 100, "product_id": 10})).await;

        fx.engine.delete("orders", &id(100)).await.unwrap();
        assert!(!fx.is_active("order_items", 1000).await);

        let error = fx.engine.delete("products", &id(10)).await.unwrap_err();
        assert!(matches!(error, StoreError::HasProtectedDependents { .. }));
    }

    #[tokio::test]
    async fn test_inactive_protected_dependent_ignored_when_configured() {
        let fx = Fixture::new(SoftDeleteConfig::new(false));
        fx.insert(&PRODUCTS, json!({"id": 10})).await;
        fx.insert(&ORDERS, json!({"id": 100})).await;
        fx.insert(&ITEMS, json!({"id": 1000, "order_id": 100, "product_id": 10})).await;

        fx.engine.delete("orders", &id(100)).await.unwrap();
        fx.engine.delete("products", &id(10)).await.unwrap();

        assert!(!fx.is_active("products", 10).await);
    }

    #[tokio::test]
    async fn test_set_null_clears_foreign_key_only() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&PRODUCTS, json!({"id": 10})).await;
        fx.insert(&BANNERS, json!({"id": 5, "product_id": 10})).await;
        fx.insert(&BANNERS, json!({"id": 6, "product_id": 11})).await;

        let outcome = fx.engine.delete("products", &id(10)).await.unwrap();

        assert!(outcome.was_nullified("banners", &id(5)));
        assert_eq!(fx.field("banners", 5, "product_id").await, Value::Null);
        assert!(fx.is_active("banners", 5).await);
        assert_eq!(fx.field("banners", 6, "product_id").await, json!(11));

        let update = fx
            .events()
            .into_iter()
            .find(|e| e.event_type == EventType::Update)
            .unwrap();
        assert_eq!(update.table_name, "banners");
        assert_eq!(update.payload.get("product_id"), Some(&PostgresValue::Null));
        assert_eq!(update.cascade_root(), Some("products:10"));
    }

    #[tokio::test]
    async fn test_ignore_leaves_dependents_alone() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&PRODUCTS, json!({"id": 10})).await;
        fx.insert(&NOTES, json!({"id": 1, "product_id": 10})).await;

        let outcome = fx.engine.delete("products", &id(10)).await.unwrap();

        assert!(outcome.deactivated.is_empty());
        assert!(fx.is_active("notes", 1).await);
        assert_eq!(fx.field("notes", 1, "product_id").await, json!(10));
    }

    #[tokio::test]
    async fn test_storage_failure_rolls_back_everything() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&CATEGORIES, json!({"id": 1})).await;
        fx.insert(&CATEGORIES, json!({"id": 2, "parent_id": 1})).await;
        fx.insert(&PRODUCTS, json!({"id": 10, "category_id": 2})).await;
        fx.backend.fail_writes_on("products").await;

        let error = fx.engine.delete("categories", &id(1)).await.unwrap_err();
        assert!(matches!(error, StoreError::StorageFailure { .. }));

        fx.backend.clear_failures().await;
        assert!(fx.is_active("categories", 1).await);
        assert!(fx.is_active("categories", 2).await);
        assert!(fx.is_active("products", 10).await);
        assert!(fx.events().is_empty());
    }

    #[tokio::test]
    async fn test_cyclic_relations_terminate() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&CATEGORIES, json!({"id": 1, "parent_id": 2})).await;
        fx.insert(&CATEGORIES, json!({"id": 2, "parent_id": 1})).await;

        let outcome = fx.engine.delete("categories", &id(1)).await.unwrap();

        assert_eq!(outcome.deactivated, vec![RecordRef::new("categories", id(2))]);
        assert!(!fx.is_active("categories", 1).await);
        assert!(!fx.is_active("categories", 2).await);
    }

    #[tokio::test]
    async fn test_repeat_delete_is_a_quiet_no_op() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&CATEGORIES, json!({"id": 1})).await;

        fx.engine.delete("categories", &id(1)).await.unwrap();
        let again = fx.engine.delete("categories", &id(1)).await.unwrap();

        assert!(again.deactivated.is_empty());
        assert_eq!(fx.events().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_record_and_unknown_table() {
        let fx = Fixture::new(SoftDeleteConfig::default());

        let missing = fx.engine.delete("categories", &id(9)).await.unwrap_err();
        assert!(missing.is_not_found());

        let unknown = fx.engine.delete("widgets", &id(1)).await.unwrap_err();
        assert!(matches!(unknown, StoreError::InvalidConfiguration { .. }));
    }

    #[tokio::test]
    async fn test_restore_does_not_cascade() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&CATEGORIES, json!({"id": 1})).await;
        fx.insert(&PRODUCTS, json!({"id": 10, "category_id": 1})).await;

        fx.engine.delete("categories", &id(1)).await.unwrap();
        fx.engine.restore("categories", &id(1)).await.unwrap();

        assert!(fx.is_active("categories", 1).await);
        assert!(!fx.is_active("products", 10).await);
        assert_eq!(
            fx.events().last().map(|e| e.event_type),
            Some(EventType::Restore)
        );
    }

    #[tokio::test]
    async fn test_delete_many_reports_each_record() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&PRODUCTS, json!({"id": 10})).await;
        fx.insert(&PRODUCTS, json!({"id": 11})).await;
        fx.insert(&ORDERS, json!({"id": 100})).await;
        fx.insert(&ITEMS, json!({"id": 1000, "order_id": 100, "product_id": 11})).await;

        let report = fx
            .engine
            .delete_many("products", &[id(10), id(11), id(12)])
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert!(report
            .failure_for(&id(11))
            .is_some_and(|e| e.protected_dependents().is_some()));
        assert!(report.failure_for(&id(12)).is_some_and(StoreError::is_not_found));
        assert!(!fx.is_active("products", 10).await);
        assert!(fx.is_active("products", 11).await);
    }

    #[tokio::test]
    async fn test_delete_where_only_touches_active_matches() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&CATEGORIES, json!({"id": 1, "title": "Shoes"})).await;
        fx.insert(&CATEGORIES, json!({"id": 2, "title": "Shorts"})).await;
        fx.insert(&CATEGORIES, json!({"id": 3, "title": "Hats"})).await;
        fx.insert(&CATEGORIES, json!({"id": 4, "title": "Shirts", "is_active": false})).await;

        let query = QueryBuilder::new().filter(QueryFilter::like("title", "Sh%"));
        let report = fx.engine.delete_where("categories", query).await.unwrap();

        assert_eq!(report.succeeded.len(), 2);
        assert!(fx.is_active("categories", 3).await);
        assert_eq!(fx.events().len(), 2);
    }

    #[tokio::test]
    async fn test_hard_delete_checks_protect_only() {
        let fx = Fixture::new(SoftDeleteConfig::default());
        fx.insert(&PRODUCTS, json!({"id": 10})).await;
        fx.insert(&PRODUCTS, json!({"id": 11, "is_active": false})).await;
        fx.insert(&ORDERS, json!({"id": 100})).await;
        fx.insert(&ITEMS, json!({"id": 1000, "order_id": 100, "product_id": 10})).await;

        let blocked = fx.engine.hard_delete("products", &id(10)).await.unwrap_err();
        assert!(blocked.protected_dependents().is_some());

        fx.engine.hard_delete("products", &id(11)).await.unwrap();
        assert!(fx.backend.raw_row("products", &id(11)).await.is_none());

        let report = fx
            .engine
            .hard_delete_where("orders", QueryScope::All, QueryBuilder::new())
            .await
            .unwrap();
        assert_eq!(report.succeeded, vec![id(100)]);
        assert_eq!(fx.backend.row_count("orders").await, 0);

        let kinds: Vec<_> = fx.events().iter().map(|e| e.event_type).collect();
        assert_eq!(kinds, vec![EventType::HardDelete, EventType::HardDelete]);
    }
}
