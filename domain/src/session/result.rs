//! Delegation outcomes.

use super::entities::SessionRef;
use super::state::SessionState;
use crate::backend::kind::BackendKind;
use crate::setup::guide::SetupGuide;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Category of a runtime failure reported inside an [`ExecutionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultErrorKind {
    /// The backend reported failure or returned an error.
    Backend,
    /// The caller's wait budget ran out; the session may still be running.
    Timeout,
    /// The caller cancelled, or rejected the plan.
    Cancelled,
    /// A plan is waiting for approval that was deferred.
    ApprovalPending,
}

impl ResultErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultErrorKind::Backend => "backend",
            ResultErrorKind::Timeout => "timeout",
            ResultErrorKind::Cancelled => "cancelled",
            ResultErrorKind::ApprovalPending => "approval_pending",
        }
    }
}

impl std::fmt::Display for ResultErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializable error attached to an unsuccessful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    pub kind: ResultErrorKind,
    pub backend: BackendKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ResultError {
    pub fn new(kind: ResultErrorKind, backend: BackendKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            backend,
            message: message.into(),
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }
}

impl std::fmt::Display for ResultError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.backend, self.kind, self.message)?;
        if let Some(remediation) = &self.remediation {
            write!(f, " ({})", remediation)?;
        }
        Ok(())
    }
}

/// Final result of driving one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub backend_used: BackendKind,
    pub session: SessionRef,
    pub state: SessionState,
    /// Every state the session passed through, in order.
    pub state_history: Vec<SessionState>,
    pub modified_files: BTreeSet<PathBuf>,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub log_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResultError>,
}

impl ExecutionResult {
    /// Build a result for `session` that ended in `state`.
    ///
    /// `success` follows the state; attach an error with [`Self::with_error`].
    pub fn new(session: SessionRef, state: SessionState, elapsed: Duration) -> Self {
        Self {
            success: state.is_success(),
            backend_used: session.backend,
            session,
            state,
            state_history: vec![state],
            modified_files: BTreeSet::new(),
            elapsed,
            log_text: String::new(),
            error: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_history(mut self, history: Vec<SessionState>) -> Self {
        self.state_history = history;
        self
    }

    pub fn with_modified_files(mut self, files: BTreeSet<PathBuf>) -> Self {
        self.modified_files = files;
        self
    }

    pub fn with_log_text(mut self, log_text: impl Into<String>) -> Self {
        self.log_text = log_text.into();
        self
    }

    pub fn with_error(mut self, error: ResultError) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Whether the reference can still be used for a later status check.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self.state,
            SessionState::TimedOut | SessionState::AwaitingApproval | SessionState::Running
        )
    }
}

/// What `delegate` produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DelegationOutcome {
    Executed { result: ExecutionResult },
    SetupRequired { guide: SetupGuide },
}

impl DelegationOutcome {
    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            DelegationOutcome::Executed { result } => Some(result),
            DelegationOutcome::SetupRequired { .. } => None,
        }
    }

    pub fn guide(&self) -> Option<&SetupGuide> {
        match self {
            DelegationOutcome::SetupRequired { guide } => Some(guide),
            DelegationOutcome::Executed { .. } => None,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
