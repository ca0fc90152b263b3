//! In-process storage backend
//!
//! Tables live in insertion order behind one async mutex. A transaction holds
//! that mutex for its whole lifetime and edits a private copy of the state,
//! which replaces the shared state only on commit.

use super::{row_id, Row, StorageBackend, StorageTransaction};
use crate::errors::StoreError;
use crate::id_type::UniversalId;
use crate::query_builder::QueryBuilder;
use crate::relation::Relation;
use crate::schema::TableSchema;
use crate::scope::QueryScope;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Table = IndexMap<String, Row>;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    tables: HashMap<String, Table>,
    failing_tables: HashSet<String>,
}

impl MemoryState {
    fn check_writable(&self, table: &str, operation: &str) -> Result<(), StoreError> {
        if self.failing_tables.contains(table) {
            return Err(StoreError::storage(
                table,
                operation,
                format!("injected write failure on {}", table),
            ));
        }
        Ok(())
    }

    fn rows(&self, table: &str) -> impl Iterator<Item = &Row> {
        self.tables.get(table).into_iter().flat_map(|t| t.values())
    }

    /// Apply `edit` to each existing row among `ids`; returns how many were touched
    fn edit_rows<F>(&mut self, schema: &TableSchema, ids: &[UniversalId], mut edit: F) -> u64
    where
        F: FnMut(&mut Row),
    {
        let Some(table) = self.tables.get_mut(schema.table) else {
            return 0;
        };

        let mut touched = 0;
        for id in ids {
            if let Some(row) = table.get_mut(&id.to_string()) {
                edit(row);
                row.insert("updated_at".to_string(), timestamp());
                touched += 1;
            }
        }
        touched
    }
}

/// String key shared by a JSON id value and its [`UniversalId`] display form
fn json_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn flag_of(schema: &TableSchema, row: &Row) -> bool {
    row.get(schema.soft_delete_field)
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// Storage held entirely in memory, for tests and embedded use
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `table` fail with a storage error
    pub async fn fail_writes_on(&self, table: &str) {
        self.state.lock().await.failing_tables.insert(table.to_string());
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failing_tables.clear();
    }

    /// Stored row regardless of its soft-delete flag
    pub async fn raw_row(&self, table: &str, id: &UniversalId) -> Option<Row> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table)
            .and_then(|t| t.get(&id.to_string()))
            .cloned()
    }

    /// Number of physically stored rows in `table`
    pub async fn row_count(&self, table: &str) -> usize {
        self.state.lock().await.tables.get(table).map_or(0, IndexMap::len)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn fetch(&self, schema: &TableSchema, query: &QueryBuilder) -> Result<Vec<Row>, StoreError> {
        let state = self.state.lock().await;
        Ok(query.evaluate(state.rows(schema.table)))
    }

    async fn count(&self, schema: &TableSchema, query: &QueryBuilder) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        let matched = query.without_paging().evaluate(state.rows(schema.table)).len();
        Ok(i64::try_from(matched).unwrap_or(i64::MAX))
    }

    async fn insert(&self, schema: &TableSchema, mut row: Row) -> Result<Row, StoreError> {
        let mut state = self.state.lock().await;
        state.check_writable(schema.table, "insert")?;

        let table = state.tables.entry(schema.table.to_string()).or_default();
        let key = match row.get(schema.primary_key).and_then(json_key) {
            Some(key) => key,
            None => {
                let next = table
                    .values()
                    .filter_map(|r| r.get(schema.primary_key).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0)
                    + 1;
                row.insert(schema.primary_key.to_string(), Value::from(next));
                next.to_string()
            }
        };

        if table.contains_key(&key) {
            return Err(StoreError::storage(
                schema.table,
                "insert",
                format!("duplicate key value {}", key),
            ));
        }

        if !matches!(row.get(schema.soft_delete_field), Some(Value::Bool(_))) {
            row.insert(schema.soft_delete_field.to_string(), Value::Bool(true));
        }
        let now = timestamp();
        row.insert("created_at".to_string(), now.clone());
        row.insert("updated_at".to_string(), now);

        table.insert(key, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        schema: &TableSchema,
        id: &UniversalId,
        changes: Row,
    ) -> Result<Option<Row>, StoreError> {
        let mut state = self.state.lock().await;
        state.check_writable(schema.table, "update")?;

        let updated = state
            .tables
            .get_mut(schema.table)
            .and_then(|t| t.get_mut(&id.to_string()))
            .map(|row| {
                for (column, value) in changes {
                    if column != schema.primary_key {
                        row.insert(column, value);
                    }
                }
                row.insert("updated_at".to_string(), timestamp());
                row.clone()
            });

        Ok(updated)
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StorageTransaction for MemoryTransaction {
    async fn record_state(
        &mut self,
        schema: &TableSchema,
        id: &UniversalId,
    ) -> Result<Option<bool>, StoreError> {
        Ok(self
            .working
            .tables
            .get(schema.table)
            .and_then(|t| t.get(&id.to_string()))
            .map(|row| flag_of(schema, row)))
    }

    async fn dependents(
        &mut self,
        relation: &Relation,
        dependent: &TableSchema,
        parent_id: &UniversalId,
        scope: QueryScope,
    ) -> Result<Vec<UniversalId>, StoreError> {
        let parent_key = parent_id.to_string();
        Ok(self
            .working
            .rows(dependent.table)
            .filter(|row| {
                row.get(relation.foreign_key).and_then(json_key).as_deref() == Some(parent_key.as_str())
            })
            .filter(|row| scope.admits(flag_of(dependent, row)))
            .filter_map(|row| row_id(dependent, row))
            .collect())
    }

    async fn set_active(
        &mut self,
        schema: &TableSchema,
        ids: &[UniversalId],
        active: bool,
    ) -> Result<u64, StoreError> {
        self.working.check_writable(schema.table, "set_active")?;
        let flag = schema.soft_delete_field.to_string();
        Ok(self.working.edit_rows(schema, ids, |row| {
            row.insert(flag.clone(), Value::Bool(active));
        }))
    }

    async fn clear_foreign_key(
        &mut self,
        schema: &TableSchema,
        foreign_key: &str,
        ids: &[UniversalId],
    ) -> Result<u64, StoreError> {
        self.working.check_writable(schema.table, "clear_foreign_key")?;
        Ok(self.working.edit_rows(schema, ids, |row| {
            row.insert(foreign_key.to_string(), Value::Null);
        }))
    }

    async fn remove(&mut self, schema: &TableSchema, ids: &[UniversalId]) -> Result<u64, StoreError> {
        self.working.check_writable(schema.table, "remove")?;
        let Some(table) = self.working.tables.get_mut(schema.table) else {
            return Ok(0);
        };

        let mut removed = 0;
        for id in ids {
            if table.shift_remove(&id.to_string()).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
