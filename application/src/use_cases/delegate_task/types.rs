//! Delegation error taxonomy.

use relay_domain::{
    BackendKind, DomainError, ExecutionResult, ResultErrorKind, SelectionError, SessionRef,
};
use thiserror::Error;

/// Errors that can occur while delegating a task.
///
/// Structural failures (missing prerequisite, unresolvable source, unavailable
/// forced backend) surface here immediately and are never retried. Runtime
/// outcomes (backend failure, time-out, cancellation) are reported inside the
/// [`ExecutionResult`]; [`DelegationError::from_result`] converts them back
/// for callers that want an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DelegationError {
    #[error("[{backend}] {cause}")]
    Configuration {
        backend: BackendKind,
        cause: String,
        remediation: Option<String>,
    },

    #[error("[{backend}] could not resolve a remote source: {cause}")]
    Resolution {
        backend: BackendKind,
        cause: String,
        remediation: Option<String>,
    },

    #[error("[{backend}] session creation failed: {cause}")]
    SessionCreation {
        backend: BackendKind,
        cause: String,
        remediation: Option<String>,
    },

    #[error("[{}] timed out waiting for {session}; the session may still be running", .session.backend)]
    Timeout { session: SessionRef },

    #[error("[{backend}] {cause}")]
    Backend { backend: BackendKind, cause: String },

    #[error("Delegation cancelled")]
    Cancelled { backend: Option<BackendKind> },

    #[error("[{backend}] plan approval is required but this backend does not support it")]
    PlanApprovalUnsupported { backend: BackendKind },

    #[error("Plan approval is required but no approval-capable backend is available (available: {})", format_kinds(.available))]
    PlanApprovalUnavailable { available: Vec<BackendKind> },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn format_kinds(kinds: &[BackendKind]) -> String {
    if kinds.is_empty() {
        return "none".to_string();
    }
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DelegationError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DelegationError::Cancelled { .. })
    }

    /// The backend the error concerns, when there is exactly one.
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            DelegationError::Configuration { backend, .. }
            | DelegationError::Resolution { backend, .. }
            | DelegationError::SessionCreation { backend, .. }
            | DelegationError::Backend { backend, .. }
            | DelegationError::PlanApprovalUnsupported { backend } => Some(*backend),
            DelegationError::Timeout { session } => Some(session.backend),
            DelegationError::Cancelled { backend } => *backend,
            DelegationError::PlanApprovalUnavailable { .. } => Some(BackendKind::RemoteApi),
            DelegationError::Domain(_) => None,
        }
    }

    /// The smallest step that would fix the problem, if one is known.
    pub fn remediation(&self) -> Option<String> {
        match self {
            DelegationError::Configuration { remediation, .. }
            | DelegationError::Resolution { remediation, .. }
            | DelegationError::SessionCreation { remediation, .. } => remediation.clone(),
            DelegationError::Timeout { session } => {
                Some(format!("check later: agent-relay status {}", session))
            }
            DelegationError::PlanApprovalUnsupported { .. } => {
                Some("use --mode api, or drop --approval".to_string())
            }
            DelegationError::PlanApprovalUnavailable { .. } => Some(
                "configure the remote API (see: agent-relay agents)".to_string(),
            ),
            DelegationError::Backend { .. }
            | DelegationError::Cancelled { .. }
            | DelegationError::Domain(_) => None,
        }
    }

    /// Error equivalent of an unsuccessful result, if it carries one.
    ///
    /// Pending approvals are not errors and return `None`.
    pub fn from_result(result: &ExecutionResult) -> Option<DelegationError> {
        let error = result.error.as_ref()?;
        match error.kind {
            ResultErrorKind::Timeout => Some(DelegationError::Timeout {
                session: result.session.clone(),
            }),
            ResultErrorKind::Cancelled => Some(DelegationError::Cancelled {
                backend: Some(error.backend),
            }),
            ResultErrorKind::Backend => Some(DelegationError::Backend {
                backend: error.backend,
                cause: error.message.clone(),
            }),
            ResultErrorKind::ApprovalPending => None,
        }
    }
}

impl From<SelectionError> for DelegationError {
    fn from(error: SelectionError) -> Self {
        match error {
            SelectionError::ForcedBackendUnavailable { backend, reason } => {
                DelegationError::Configuration {
                    backend,
                    cause: reason,
                    remediation: None,
                }
            }
            SelectionError::PlanApprovalUnsupported { backend } => {
                DelegationError::PlanApprovalUnsupported { backend }
            }
            SelectionError::PlanApprovalUnavailable { available } => {
                DelegationError::PlanApprovalUnavailable { available }
            }
            SelectionError::Domain(e) => DelegationError::Domain(e),
        }
    }
}
