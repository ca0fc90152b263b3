use crate::backend::{Row, StorageBackend};
use crate::errors::StoreError;
use crate::id_type::{HasUniversalId, UniversalId};
use crate::schema::TableSchema;
use crate::soft_delete::SoftDeleteEngine;
use crate::traits::TableMetadata;
use serde_json::Value;
use signal_system::{DatabaseEvent, EventType, SignalManager};
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed store over one table
///
/// Writes and deletes go through the shared [`SoftDeleteEngine`], so every
/// store handed out by the same coordinator sees the same relations.
#[derive(Clone)]
pub struct GenericStore<T: TableMetadata> {
    pub(crate) engine: SoftDeleteEngine,
    pub(crate) _phantom: PhantomData<T>,
}

impl<T: TableMetadata> std::fmt::Debug for GenericStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericStore")
            .field("table", &T::table_name())
            .field("has_signals", &self.has_signals())
            .finish()
    }
}

impl<T: TableMetadata> GenericStore<T> {
    pub fn new(engine: SoftDeleteEngine) -> Self {
        Self {
            engine,
            _phantom: PhantomData,
        }
    }

    pub fn engine(&self) -> &SoftDeleteEngine {
        &self.engine
    }

    pub fn has_signals(&self) -> bool {
        self.engine.signals().is_some()
    }

    pub(crate) fn backend(&self) -> &Arc<dyn StorageBackend> {
        self.engine.backend()
    }

    pub(crate) fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.engine.signals()
    }

    pub(crate) fn schema(&self) -> TableSchema {
        T::schema()
    }

    pub(crate) fn universal_id(id: &T::Id) -> UniversalId {
        id.universal_id()
    }

    pub(crate) fn to_model(row: Row) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    pub(crate) fn to_models(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
        rows.into_iter().map(Self::to_model).collect()
    }

    /// Model fields as a row, keeping only `columns`
    pub(crate) fn to_row(data: &T, columns: &[&str]) -> Result<Row, StoreError> {
        let Value::Object(mut source) = serde_json::to_value(data)? else {
            return Err(StoreError::validation(
                T::table_name(),
                "model",
                "model must serialize to a JSON object",
            ));
        };

        let mut row = Row::new();
        for column in columns {
            if let Some(value) = source.remove(*column) {
                row.insert((*column).to_string(), value);
            }
        }
        Ok(row)
    }

    pub(crate) fn emit_record_event(&self, event_type: EventType, record: &T) {
        let Some(signals) = self.signals() else {
            return;
        };

        let mut event = DatabaseEvent::new(event_type, T::table_name())
            .with_record_id(record.extract_id().universal_id().to_string());
        event.payload = signal_system::serialize_to_postgres_payload(record);
        event.add_payload("__record__", signal_system::serialize_to_postgres_record(record));
        signals.emit(event);
    }
}
