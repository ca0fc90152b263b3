//! Serialization utilities
//!
//! Converts serde-serializable records into [`PostgresValue`] maps.

use crate::types::PostgresValue;
use serde::Serialize;
use std::collections::HashMap;

/// Convert serializable data to PostgresValue::Record
pub fn serialize_to_postgres_record<T: Serialize>(data: &T) -> PostgresValue {
    PostgresValue::Record(serialize_to_postgres_payload(data))
}

/// Serialize to JSON first, then convert every top-level field
///
/// Non-object values produce an empty payload.
pub fn serialize_to_postgres_payload<T: Serialize>(data: &T) -> HashMap<String, PostgresValue> {
    let mut payload = HashMap::new();

    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(data) {
        for (key, value) in map {
            payload.insert(key, json_to_postgres_value(value));
        }
    }

    payload
}

/// Best-effort typing of a single JSON value
pub fn json_to_postgres_value(value: serde_json::Value) -> PostgresValue {
    match value {
        serde_json::Value::String(s) => {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                PostgresValue::Timestamp(dt.with_timezone(&chrono::Utc))
            } else if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                PostgresValue::Uuid(uuid)
            } else {
                PostgresValue::Text(s)
            }
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => PostgresValue::Integer(small),
                    Err(_) => PostgresValue::BigInt(i),
                }
            } else if let Some(f) = n.as_f64() {
                PostgresValue::Float(f)
            } else {
                PostgresValue::Json(serde_json::Value::Number(n))
            }
        }
        serde_json::Value::Bool(b) => PostgresValue::Boolean(b),
        serde_json::Value::Null => PostgresValue::Null,
        other => PostgresValue::Json(other),
    }
}
