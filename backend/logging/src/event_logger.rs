//! Layer Event Logger
//!
//! One structured event per extraction layer, emitted through `tracing` so
//! the JSON file layer writes it as NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerEvent {
    /// The model produced an answer, either directly or recovered from reasoning.
    Answered {
        layer: String,
        source: String,
        answer: String,
    },
    /// The layer fell back to the sentinel.
    Degraded { layer: String, reason: String },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub inspection_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: LayerEvent,
}

#[derive(Debug, Clone, Copy)]
pub struct LayerEventLogger {
    redact: bool,
}

impl Default for LayerEventLogger {
    fn default() -> Self {
        Self { redact: true }
    }
}

impl LayerEventLogger {
    pub fn new(redact: bool) -> Self {
        Self { redact }
    }

    /// Build the log entry, scrubbing model-derived text when redaction is on.
    pub fn entry(&self, inspection_id: &str, mut event: LayerEvent) -> EventLogEntry {
        if self.redact {
            match &mut event {
                LayerEvent::Answered { answer, .. } => *answer = redact_sensitive_data(answer),
                LayerEvent::Degraded { reason, .. } => *reason = redact_sensitive_data(reason),
            }
        }
        EventLogEntry {
            inspection_id: inspection_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log_event(&self, inspection_id: &str, event: LayerEvent) {
        let entry = self.entry(inspection_id, event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        match &entry.event {
            LayerEvent::Answered { layer, source, .. } => {
                info!(target: "layer_events", inspection_id, layer = %layer, source = %source, event = %json, "Layer answered");
            }
            LayerEvent::Degraded { layer, reason } => {
                warn!(target: "layer_events", inspection_id, layer = %layer, reason = %reason, event = %json, "Layer degraded");
            }
        }
    }
}
