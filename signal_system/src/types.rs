//! Type definitions for signal system

use crate::event::DatabaseEvent;
use std::sync::Arc;

// Re-export from type-mapping for convenience
pub use type_mapping::{serialize_to_postgres_payload, serialize_to_postgres_record, PostgresValue};

/// Event callback; an `Err` is counted and logged, never propagated to the store
pub type EventCallback = Arc<dyn Fn(&DatabaseEvent) -> anyhow::Result<()> + Send + Sync>;
