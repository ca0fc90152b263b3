//! Database event types and definitions
//!
//! This module defines the structure of database events
//! that flow through the signal system.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::PostgresValue;

/// Database event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Create,
    Update,
    /// Record flag flipped to inactive (directly or through a cascade)
    SoftDelete,
    Restore,
    /// Row physically removed
    HardDelete,
}

/// Database event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseEvent {
    pub event_type: EventType,
    pub table_name: String,
    /// Record ID (if available)
    pub record_id: Option<String>,
    pub payload: HashMap<String, PostgresValue>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DatabaseEvent {
    pub fn new(event_type: EventType, table_name: impl Into<String>) -> Self {
        Self {
            event_type,
            table_name: table_name.into(),
            record_id: None,
            payload: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<PostgresValue>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn add_payload(&mut self, key: impl Into<String>, value: impl Into<PostgresValue>) {
        self.payload.insert(key.into(), value.into());
    }

    /// The record that started a cascade, as `table:id`, when this event is part of one
    pub fn cascade_root(&self) -> Option<&str> {
        match self.payload.get("cascade_root") {
            Some(PostgresValue::Text(root)) => Some(root.as_str()),
            _ => None,
        }
    }
}
