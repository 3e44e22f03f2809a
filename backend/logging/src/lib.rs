//! Telemetry and structured logging components for TagScan.
//!
//! Handles log redaction, JSON output generation, file rotation, and per-layer inspection event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, LayerEvent, LayerEventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
