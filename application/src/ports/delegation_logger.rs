//! Port for structured delegation logging.
//!
//! Defines the [`DelegationLogger`] trait for recording delegation events
//! (backend selection, session creation, state changes, outcomes) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable record (JSONL) a caller can audit later.

use serde_json::Value;

/// A structured delegation event.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The adapter adds the timestamp.
pub struct DelegationEvent {
    /// Event type identifier (e.g., "backend_selected", "delegation_cancelled").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl DelegationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging delegation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// `log` is synchronous and non-fallible; logging failures never disrupt a
/// delegation.
pub trait DelegationLogger: Send + Sync {
    fn log(&self, event: DelegationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoDelegationLogger;

impl DelegationLogger for NoDelegationLogger {
    fn log(&self, _event: DelegationEvent) {}
}
