//! Structured logging for ScribeForge.
//!
//! Console plus rolling JSON file output, the `action_events` audit stream
//! for tool invocations and checkpoints, and secret redaction for both.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ActionEvent, EventLogEntry, EventLogger};
pub use logger::{init_console_logger, init_logger};
pub use redact::redact_sensitive_data;
