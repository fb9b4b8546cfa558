//! Plan approval port.
//!
//! When a request needs plan approval, the remote backend drafts a plan and
//! waits. The session manager then asks this port what to do.
//!
//! # Flow
//!
//! ```text
//! session created (AWAITING_APPROVAL)
//!        ↓
//! backend reports AWAITING_PLAN_APPROVAL
//!        ↓
//! PlanApprovalPort::review_plan()
//!        ↓
//! Approve → approve_plan(), RUNNING
//! Reject  → best-effort cancel, CANCELLED
//! Defer   → return to caller, still AWAITING_APPROVAL
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoApprovePlan`]: always approves
//! - [`DeferPlanApproval`]: always defers, leaving the decision to a later
//!   `approve` call
//!
//! For interactive use, see `InteractivePlanApproval` in the presentation layer.

use async_trait::async_trait;
use relay_domain::SessionRef;

/// Decision on a proposed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
    /// Hand the session back to the caller without deciding.
    Defer,
}

/// A drafted plan waiting for a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanReview {
    pub session: SessionRef,
    pub prompt: String,
    pub steps: Vec<String>,
}

/// Errors while collecting a decision (not the decision itself).
#[derive(Debug, Clone)]
pub enum PlanApprovalError {
    /// User cancelled the prompt (e.g. Ctrl+C).
    Cancelled,
    /// Terminal read or write failure.
    IoError(String),
}

impl std::fmt::Display for PlanApprovalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanApprovalError::Cancelled => write!(f, "Approval cancelled"),
            PlanApprovalError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PlanApprovalError {}

/// Port for deciding on drafted plans.
#[async_trait]
pub trait PlanApprovalPort: Send + Sync {
    async fn review_plan(&self, review: &PlanReview) -> Result<ApprovalDecision, PlanApprovalError>;
}

/// Approves every plan. Matches the `auto_approve` configuration switch.
pub struct AutoApprovePlan;

#[async_trait]
impl PlanApprovalPort for AutoApprovePlan {
    async fn review_plan(&self, _review: &PlanReview) -> Result<ApprovalDecision, PlanApprovalError> {
        Ok(ApprovalDecision::Approve)
    }
}

/// Defers every plan so approval surfaces to the caller.
///
/// The default for non-interactive callers.
pub struct DeferPlanApproval;

#[async_trait]
impl PlanApprovalPort for DeferPlanApproval {
    async fn review_plan(&self, _review: &PlanReview) -> Result<ApprovalDecision, PlanApprovalError> {
        Ok(ApprovalDecision::Defer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::BackendKind;

    fn review() -> PlanReview {
        PlanReview {
            session: SessionRef::new(BackendKind::RemoteApi, "1"),
            prompt: "refactor".into(),
            steps: vec!["Read code".into()],
        }
    }

    #[tokio::test]
    async fn test_auto_approve() {
        assert_eq!(
            AutoApprovePlan.review_plan(&review()).await.unwrap(),
            ApprovalDecision::Approve
        );
    }

    #[tokio::test]
    async fn test_defer() {
        assert_eq!(
            DeferPlanApproval.review_plan(&review()).await.unwrap(),
            ApprovalDecision::Defer
        );
    }
}
