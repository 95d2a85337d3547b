/**
 * Real-time Event System
 *
 * This module defines the events pushed to connected devices over the
 * realtime stream. Events carry no operation data: they only tell a device
 * that it should pull.
 */
use serde::{Deserialize, Serialize};

use crate::shared::operations::OperationType;

/// Type of real-time event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// New operations are waiting to be pulled
    OperationsAvailable,
    /// Custom event type
    Custom(String),
}

impl EventType {
    /// Name used for the SSE `event:` field
    pub fn name(&self) -> &str {
        match self {
            Self::OperationsAvailable => "operations_available",
            Self::Custom(name) => name.as_str(),
        }
    }
}

/// Real-time event delivered to subscribed devices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtimeEvent {
    /// Type of event
    pub event_type: EventType,
    /// Event payload (JSON-serializable data)
    pub payload: serde_json::Value,
    /// Timestamp when event occurred
    pub timestamp: String,
}

impl RealtimeEvent {
    /// Create a new real-time event
    pub fn new(event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Wake-up signal telling a device to pull the given channels
    pub fn operations_available(channels: &[OperationType]) -> Self {
        Self::new(
            EventType::OperationsAvailable,
            serde_json::json!({ "channels": channels }),
        )
    }
}
