//! Model event types and definitions
//!
//! This module defines the structure of events
//! that flow through the signal system.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Model event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// An entry is about to validate a new field value
    FieldSetStart,
    /// The new field value was rejected by its validator
    FieldSetInvalid,
    /// The new field value was committed to the entry
    FieldSetSuccess,
    Insert,
    Update,
    Delete,
    /// The storage backend failed while executing a statement
    QueryFailed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::FieldSetStart => "FIELD_SET_START",
            EventType::FieldSetInvalid => "FIELD_SET_INVALID",
            EventType::FieldSetSuccess => "FIELD_SET_SUCCESS",
            EventType::Insert => "INSERT",
            EventType::Update => "UPDATE",
            EventType::Delete => "DELETE",
            EventType::QueryFailed => "QUERY_FAILED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvent {
    pub event_type: EventType,
    /// Model (table) the event belongs to
    pub model: String,
    /// Field name for field-level events
    pub field: Option<String>,
    /// Primary key value, when known
    pub record_id: Option<String>,
    /// Additional data
    pub payload: HashMap<String, Value>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ModelEvent {
    pub fn new(event_type: EventType, model: &str) -> Self {
        Self {
            event_type,
            model: model.to_string(),
            field: None,
            record_id: None,
            payload: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_record_id(mut self, record_id: String) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn with_payload(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    pub fn add_payload(&mut self, key: &str, value: Value) {
        self.payload.insert(key.to_string(), value);
    }
}
