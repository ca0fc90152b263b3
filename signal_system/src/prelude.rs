//! Convenience re-exports for common signal-system usage

pub use crate::event::{DatabaseEvent, EventType};
pub use crate::manager::{CallbackId, SignalManager, SignalStats};
pub use crate::types::{
    serialize_to_postgres_payload, serialize_to_postgres_record, EventCallback, PostgresValue,
};
pub use config::SignalConfig;
