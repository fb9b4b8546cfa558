//! Backend selection policy.
//!
//! [`SelectionPolicy::select`] is a pure function of the request, the current
//! availability report and the capability registry. Rules, in order:
//!
//! 1. A forced mode binds to exactly the named backend or fails. It never
//!    substitutes another backend.
//! 2. In auto mode with no usable backend, setup is required (not an error).
//! 3. Plan approval restricts candidates to approval-capable backends; if none
//!    is available that is a hard failure.
//! 4. Heavy tasks (complex/epic, or a context larger than every synchronous
//!    backend accepts) prefer an asynchronous backend.
//! 5. Otherwise the first available backend in priority order wins.
//!
//! Interactive backends hand control to a human and are only used when forced.

use crate::backend::availability::AvailabilityReport;
use crate::backend::kind::BackendKind;
use crate::backend::registry::CapabilityRegistry;
use crate::core::error::DomainError;
use crate::task::request::TaskRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default auto-mode ordering: cheap local execution first.
pub const DEFAULT_PRIORITY: [BackendKind; 2] = [BackendKind::LocalHeadless, BackendKind::RemoteApi];

/// Why a backend was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    Forced,
    PlanApproval,
    AsyncPreferred,
    /// A heavy task fell back to priority order because no async backend
    /// was available.
    AsyncUnavailable,
    Priority,
}

impl SelectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionReason::Forced => "forced",
            SelectionReason::PlanApproval => "plan_approval",
            SelectionReason::AsyncPreferred => "async_preferred",
            SelectionReason::AsyncUnavailable => "async_unavailable",
            SelectionReason::Priority => "priority",
        }
    }
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a successful selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Backend {
        kind: BackendKind,
        reason: SelectionReason,
    },
    SetupRequired,
}

impl Selection {
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            Selection::Backend { kind, .. } => Some(*kind),
            Selection::SetupRequired => None,
        }
    }
}

/// Structural selection failures. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{backend} was requested but is unavailable: {reason}")]
    ForcedBackendUnavailable { backend: BackendKind, reason: String },

    #[error("{backend} does not support plan approval")]
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

/// Chooses a backend for a request.
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    registry: CapabilityRegistry,
    priority: Vec<BackendKind>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::new(CapabilityRegistry::default())
    }
}

impl SelectionPolicy {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry,
            priority: DEFAULT_PRIORITY.to_vec(),
        }
    }

    /// Replace the auto-mode ordering.
    ///
    /// Duplicates and interactive kinds are dropped.
    pub fn with_priority(mut self, priority: impl IntoIterator<Item = BackendKind>) -> Self {
        let mut ordered = Vec::new();
        for kind in priority {
            if !kind.is_interactive() && !ordered.contains(&kind) {
                ordered.push(kind);
            }
        }
        self.priority = ordered;
        self
    }

    pub fn priority(&self) -> &[BackendKind] {
        &self.priority
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn select(
        &self,
        request: &TaskRequest,
        report: &AvailabilityReport,
    ) -> Result<Selection, SelectionError> {
        if let Some(kind) = request.mode.forced_backend() {
            return self.select_forced(kind, request, report);
        }

        let candidates: Vec<BackendKind> = self
            .priority
            .iter()
            .copied()
            .filter(|kind| report.is_available(*kind) && self.registry.descriptor(*kind).is_ok())
            .collect();

        if candidates.is_empty() {
            return Ok(Selection::SetupRequired);
        }

        if request.needs_plan_approval {
            return candidates
                .iter()
                .copied()
                .find(|kind| self.supports_plan_approval(*kind))
                .map(|kind| Selection::Backend {
                    kind,
                    reason: SelectionReason::PlanApproval,
                })
                .ok_or(SelectionError::PlanApprovalUnavailable {
                    available: candidates,
                });
        }

        if self.is_heavy(request) {
            if let Some(kind) = candidates.iter().copied().find(|k| self.supports_async(*k)) {
                return Ok(Selection::Backend {
                    kind,
                    reason: SelectionReason::AsyncPreferred,
                });
            }
            return Ok(Selection::Backend {
                kind: candidates[0],
                reason: SelectionReason::AsyncUnavailable,
            });
        }

        Ok(Selection::Backend {
            kind: candidates[0],
            reason: SelectionReason::Priority,
        })
    }

    fn select_forced(
        &self,
        kind: BackendKind,
        request: &TaskRequest,
        report: &AvailabilityReport,
    ) -> Result<Selection, SelectionError> {
        let descriptor = self.registry.descriptor(kind)?;
        if !report.is_available(kind) {
            return Err(SelectionError::ForcedBackendUnavailable {
                backend: kind,
                reason: report.reason_for(kind),
            });
        }
        if request.needs_plan_approval && !descriptor.supports_plan_approval {
            return Err(SelectionError::PlanApprovalUnsupported { backend: kind });
        }
        Ok(Selection::Backend {
            kind,
            reason: SelectionReason::Forced,
        })
    }

    /// Complex/epic work, or a context no synchronous backend can hold.
    fn is_heavy(&self, request: &TaskRequest) -> bool {
        if request.complexity.prefers_async() {
            return true;
        }
        self.registry
            .max_sync_context_size()
            .is_some_and(|max| request.estimated_context_size > max)
    }

    fn supports_async(&self, kind: BackendKind) -> bool {
        self.registry
            .descriptor(kind)
            .is_ok_and(|d| d.supports_async)
    }

    fn supports_plan_approval(&self, kind: BackendKind) -> bool {
        self.registry
            .descriptor(kind)
            .is_ok_and(|d| d.supports_plan_approval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::availability::{BackendAvailability, ProbeDetails};
    use crate::backend::kind::BackendFamily;
    use crate::task::request::{ExecutionMode, TaskComplexity};

    fn report(remote: bool, local: bool) -> AvailabilityReport {
        let family = |available: bool, reason: &str| {
            if available {
                BackendAvailability::available(ProbeDetails::default())
            } else {
                BackendAvailability::unavailable(reason, ProbeDetails::default())
            }
        };
        AvailabilityReport::new()
            .with_family(BackendFamily::Remote, family(remote, "JULES_API_KEY not set"))
            .with_family(
                BackendFamily::Local,
                family(local, "login required (run: jules login): not authenticated"),
            )
    }

    fn request() -> TaskRequest {
        TaskRequest::new("do the thing", "/tmp/project")
    }

    const MODES: [ExecutionMode; 4] = [
        ExecutionMode::Auto,
        ExecutionMode::ForcedApi,
        ExecutionMode::ForcedCliHeadless,
        ExecutionMode::ForcedCliInteractive,
    ];

    const COMPLEXITIES: [TaskComplexity; 5] = [
        TaskComplexity::Trivial,
        TaskComplexity::Simple,
        TaskComplexity::Moderate,
        TaskComplexity::Complex,
        TaskComplexity::Epic,
    ];

    #[test]
    fn test_local_only_trivial_selects_local() {
        let policy = SelectionPolicy::default();
        let selection = policy
            .select(
                &request().with_complexity(TaskComplexity::Trivial),
                &report(false, true),
            )
            .unwrap();
        assert_eq!(selection.backend(), Some(BackendKind::LocalHeadless));
    }

    #[test]
    fn test_nothing_available_requires_setup() {
        let policy = SelectionPolicy::default();
        let selection = policy.select(&request(), &report(false, false)).unwrap();
        assert_eq!(selection, Selection::SetupRequired);

        let with_approval = request().with_plan_approval(true);
        assert_eq!(
            policy.select(&with_approval, &report(false, false)).unwrap(),
            Selection::SetupRequired
        );
    }

    #[test]
    fn test_plan_approval_never_binds_incapable_backend() {
        let policy = SelectionPolicy::default();
        for mode in MODES {
            for complexity in COMPLEXITIES {
                for (remote, local) in [(true, true), (true, false), (false, true), (false, false)] {
                    let req = request()
                        .with_mode(mode)
                        .with_complexity(complexity)
                        .with_plan_approval(true);
                    if let Ok(Selection::Backend { kind, .. }) =
                        policy.select(&req, &report(remote, local))
                    {
                        let descriptor = policy.registry().descriptor(kind).unwrap();
                        assert!(descriptor.supports_plan_approval, "{:?} bound {}", mode, kind);
                    }
                }
            }
        }
    }

    #[test]
    fn test_plan_approval_unavailable_is_hard_failure() {
        let policy = SelectionPolicy::default();
        let err = policy
            .select(&request().with_plan_approval(true), &report(false, true))
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::PlanApprovalUnavailable {
                available: vec![BackendKind::LocalHeadless]
            }
        );
    }

    #[test]
    fn test_forced_unavailable_never_substitutes() {
        let policy = SelectionPolicy::default();
        let err = policy
            .select(
                &request().with_mode(ExecutionMode::ForcedCliHeadless),
                &report(true, false),
            )
            .unwrap_err();
        match err {
            SelectionError::ForcedBackendUnavailable { backend, reason } => {
                assert_eq!(backend, BackendKind::LocalHeadless);
                assert!(reason.contains("login required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = policy
            .select(
                &request().with_mode(ExecutionMode::ForcedApi),
                &report(false, true),
            )
            .unwrap_err();
        assert!(err.to_string().contains("remote_api"));
    }

    #[test]
    fn test_forced_approval_on_incapable_backend() {
        let policy = SelectionPolicy::default();
        let err = policy
            .select(
                &request()
                    .with_mode(ExecutionMode::ForcedCliHeadless)
                    .with_plan_approval(true),
                &report(true, true),
            )
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::PlanApprovalUnsupported {
                backend: BackendKind::LocalHeadless
            }
        );
    }

    #[test]
    fn test_forced_interactive_is_allowed() {
        let policy = SelectionPolicy::default();
        let selection = policy
            .select(
                &request().with_mode(ExecutionMode::ForcedCliInteractive),
                &report(false, true),
            )
            .unwrap();
        assert_eq!(
            selection,
            Selection::Backend {
                kind: BackendKind::LocalInteractive,
                reason: SelectionReason::Forced
            }
        );
    }

    #[test]
    fn test_heavy_tasks_prefer_async() {
        let policy = SelectionPolicy::default();
        let epic = request().with_complexity(TaskComplexity::Epic);
        assert_eq!(
            policy.select(&epic, &report(true, true)).unwrap(),
            Selection::Backend {
                kind: BackendKind::RemoteApi,
                reason: SelectionReason::AsyncPreferred
            }
        );

        let large = request().with_context_size(50_000);
        assert_eq!(
            policy.select(&large, &report(true, true)).unwrap().backend(),
            Some(BackendKind::RemoteApi)
        );

        assert_eq!(
            policy.select(&epic, &report(false, true)).unwrap(),
            Selection::Backend {
                kind: BackendKind::LocalHeadless,
                reason: SelectionReason::AsyncUnavailable
            }
        );
    }

    #[test]
    fn test_priority_order_is_configurable() {
        let policy = SelectionPolicy::default().with_priority([
            BackendKind::RemoteApi,
            BackendKind::LocalInteractive,
            BackendKind::RemoteApi,
            BackendKind::LocalHeadless,
        ]);
        assert_eq!(
            policy.priority(),
            &[BackendKind::RemoteApi, BackendKind::LocalHeadless]
        );
        assert_eq!(
            policy.select(&request(), &report(true, true)).unwrap().backend(),
            Some(BackendKind::RemoteApi)
        );
    }

    #[test]
    fn test_auto_never_selects_interactive() {
        let policy = SelectionPolicy::default();
        for complexity in COMPLEXITIES {
            for (remote, local) in [(true, true), (false, true)] {
                let selection = policy
                    .select(&request().with_complexity(complexity), &report(remote, local))
                    .unwrap();
                assert_ne!(selection.backend(), Some(BackendKind::LocalInteractive));
            }
        }
    }
}
