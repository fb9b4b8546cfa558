//! Progress notification port
//!
//! Defines the interface for reporting progress while a delegation runs.

use relay_domain::{BackendKind, ExecutionResult, SelectionReason, SessionRef, SessionState};
use std::time::Duration;

/// Callback for progress updates during delegation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain log lines, etc.)
pub trait DelegationProgress: Send + Sync {
    /// Called once a backend has been chosen.
    fn on_backend_selected(&self, kind: BackendKind, reason: SelectionReason);

    /// Called when the backend has accepted the session.
    fn on_session_created(&self, session: &SessionRef);

    /// Called on every session state transition.
    fn on_state_change(&self, session: &SessionRef, from: SessionState, to: SessionState);

    /// Called after each status poll.
    fn on_poll(&self, _session: &SessionRef, _elapsed: Duration) {}

    /// Called when a plan is waiting for a decision.
    fn on_plan_ready(&self, _session: &SessionRef, _steps: &[String]) {}

    /// Called when the wait ends, whatever the outcome.
    fn on_finished(&self, _result: &ExecutionResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DelegationProgress for NoProgress {
    fn on_backend_selected(&self, _kind: BackendKind, _reason: SelectionReason) {}
    fn on_session_created(&self, _session: &SessionRef) {}
    fn on_state_change(&self, _session: &SessionRef, _from: SessionState, _to: SessionState) {}
}
