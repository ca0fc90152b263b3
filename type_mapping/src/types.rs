//! Runtime PostgreSQL values
//!
//! Event payloads carry field values as [`PostgresValue`] so listeners can tell
//! timestamps and ids apart from plain text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostgresValue {
    Text(String),
    Integer(i32),
    BigInt(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Json(serde_json::Value),
    Record(HashMap<String, PostgresValue>), // Associative array for full records
    Null,
}

impl PostgresValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PostgresValue::Null)
    }
}

impl From<String> for PostgresValue {
    fn from(val: String) -> Self {
        PostgresValue::Text(val)
    }
}

impl From<&str> for PostgresValue {
    fn from(val: &str) -> Self {
        PostgresValue::Text(val.to_string())
    }
}

impl From<i32> for PostgresValue {
    fn from(val: i32) -> Self {
        PostgresValue::Integer(val)
    }
}

impl From<i64> for PostgresValue {
    fn from(val: i64) -> Self {
        PostgresValue::BigInt(val)
    }
}

impl From<usize> for PostgresValue {
    fn from(val: usize) -> Self {
        PostgresValue::BigInt(i64::try_from(val).unwrap_or(i64::MAX))
    }
}

impl From<bool> for PostgresValue {
    fn from(val: bool) -> Self {
        PostgresValue::Boolean(val)
    }
}

impl From<Uuid> for PostgresValue {
    fn from(val: Uuid) -> Self {
        PostgresValue::Uuid(val)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for PostgresValue {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        PostgresValue::Timestamp(val)
    }
}

impl From<serde_json::Value> for PostgresValue {
    fn from(val: serde_json::Value) -> Self {
        PostgresValue::Json(val)
    }
}

impl<T> From<Option<T>> for PostgresValue
where
    T: Into<PostgresValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => PostgresValue::Null,
        }
    }
}
