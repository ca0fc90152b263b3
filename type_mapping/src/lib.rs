//! Unified type mapping between Rust types and PostgreSQL
//!
//! Used by the `#[model]` derive to type generated columns and by the signal
//! system to carry record snapshots in event payloads.

pub mod serialize;
pub mod sql;
pub mod types;

pub use serialize::{json_to_postgres_value, serialize_to_postgres_payload, serialize_to_postgres_record};
pub use sql::{is_optional_type, rust_type_to_pg_type, strip_option};
pub use types::PostgresValue;
