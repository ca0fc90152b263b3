//! Signal system for database event handling
//!
//! Stores emit a [`DatabaseEvent`] after each committed write: creates, updates,
//! soft deletes (one event per deactivated record, cascades included), restores,
//! foreign-key nullifications and hard deletes.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

pub use config::SignalConfig;
pub use event::{DatabaseEvent, EventType};
pub use manager::{CallbackId, SignalManager, SignalStats};
pub use types::{serialize_to_postgres_payload, serialize_to_postgres_record, EventCallback, PostgresValue};
