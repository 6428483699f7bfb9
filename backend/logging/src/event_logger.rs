//! Action Event Logger
//!
//! Structured audit events (tool invoked, tool failed, checkpoint) emitted on
//! the `action_events` tracing target, which the JSON file layer persists as
//! NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEvent {
    ToolInvoked {
        tool_name: String,
        arguments_json: String,
    },
    ToolFailed {
        tool_name: String,
        error_msg: String,
        elapsed_ms: i64,
    },
    ToolSucceeded {
        tool_name: String,
        elapsed_ms: i64,
    },
    Checkpoint {
        tool_name: String,
        paths: Vec<String>,
        status: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct EventLogEntry {
    pub invocation_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ActionEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redacts free-text fields, then emits the event through `tracing`.
    pub fn log_event(invocation_id: &str, mut event: ActionEvent) -> EventLogEntry {
        match &mut event {
            ActionEvent::ToolInvoked { arguments_json, .. } => {
                *arguments_json = redact_sensitive_data(arguments_json);
            }
            ActionEvent::ToolFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            ActionEvent::ToolSucceeded { .. } | ActionEvent::Checkpoint { .. } => {}
        }

        let entry = EventLogEntry {
            invocation_id: invocation_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "action_events", event = %json, "Action event");
        entry
    }
}
