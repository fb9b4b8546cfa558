//! Delegate Task use case
//!
//! The single entry point callers use to hand work to a coding agent:
//!
//! | Step                 | Auto mode                 | Forced mode                  |
//! |----------------------|---------------------------|------------------------------|
//! | 1. Availability      | cached report             | fresh probe of forced family |
//! | 2. Selection         | priority + capabilities   | forced backend or error      |
//! | 3. Nothing available | setup guide               | configuration error          |
//! | 4. Create session    | selected manager          | forced manager               |
//! | 5. Drive session     | until terminal / timeout  | until terminal / timeout     |

mod types;

pub use types::DelegationError;

use super::detect_availability::{AvailabilityCache, ModeDetector};
use super::session::{SessionContext, SessionManager};
use crate::ports::delegation_logger::{DelegationEvent, DelegationLogger, NoDelegationLogger};
use relay_domain::{
    AvailabilityReport, BackendKind, DelegationOutcome, ExecutionResult, ResultErrorKind,
    Selection, SelectionError, SelectionPolicy, SelectionReason, SessionRef, SessionSnapshot,
    SetupHints, TaskRequest, generate_setup_guide,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Use case for delegating a task to the best available backend.
pub struct DelegateTaskUseCase {
    policy: SelectionPolicy,
    detector: ModeDetector,
    cache: Arc<AvailabilityCache>,
    managers: BTreeMap<BackendKind, Arc<dyn SessionManager>>,
    ctx: SessionContext,
    hints: SetupHints,
    logger: Arc<dyn DelegationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl DelegateTaskUseCase {
    pub fn new(
        policy: SelectionPolicy,
        detector: ModeDetector,
        cache: Arc<AvailabilityCache>,
        ctx: SessionContext,
    ) -> Self {
        Self {
            policy,
            detector,
            cache,
            managers: BTreeMap::new(),
            ctx,
            hints: SetupHints::default(),
            logger: Arc::new(NoDelegationLogger),
            cancellation_token: None,
        }
    }

    // ==================== Builder Methods ====================

    /// Register the manager for its backend kind, replacing any earlier one.
    pub fn with_manager(mut self, manager: Arc<dyn SessionManager>) -> Self {
        self.managers.insert(manager.kind(), manager);
        self
    }

    pub fn with_setup_hints(mut self, hints: SetupHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn DelegationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    // ==================== Operations ====================

    /// Route `request` to a backend and drive the session.
    ///
    /// Returns [`DelegationOutcome::SetupRequired`] when no backend is usable
    /// in auto mode. Structural failures are errors; runtime outcomes are
    /// reported inside the result.
    pub async fn delegate(&self, request: TaskRequest) -> Result<DelegationOutcome, DelegationError> {
        request.validate()?;

        let report = match request.mode.forced_backend() {
            Some(kind) => self.detector.probe_family(kind.family()).await,
            None => self.cache.get().await,
        };

        let selection = self
            .policy
            .select(&request, &report)
            .map_err(|e| self.selection_error(e, &report))
            .inspect_err(|e| self.log_failure(None, e))?;

        let (kind, reason) = match selection {
            Selection::SetupRequired => {
                let guide = generate_setup_guide(&report, &self.hints);
                info!(options = guide.options.len(), "No backend available, returning setup guide");
                self.logger.log(DelegationEvent::new(
                    "setup_required",
                    json!({ "recommendation": guide.recommendation }),
                ));
                return Ok(DelegationOutcome::SetupRequired { guide });
            }
            Selection::Backend { kind, reason } => (kind, reason),
        };

        if reason == SelectionReason::AsyncUnavailable {
            warn!(
                backend = %kind,
                complexity = %request.complexity,
                "No async backend available for a heavy task, using priority order"
            );
        }
        info!(backend = %kind, %reason, mode = %request.mode, "Selected backend");
        self.ctx.progress.on_backend_selected(kind, reason);
        self.logger.log(DelegationEvent::new(
            "backend_selected",
            json!({
                "backend": kind,
                "reason": reason,
                "mode": request.mode.as_str(),
                "complexity": request.complexity.as_str(),
            }),
        ));

        let manager = self.manager(kind)?;
        let session = manager
            .create(&request)
            .await
            .inspect_err(|e| self.log_failure(Some(kind), e))?;
        self.logger.log(DelegationEvent::new(
            "session_created",
            json!({ "session": session.reference().to_string() }),
        ));

        let result = if request.detached && !kind.is_interactive() {
            info!(session = %session.reference(), "Detached; not waiting for the session");
            self.ctx.detached(session, self.ctx.clock.now())
        } else {
            let token = self.cancellation_token.clone().unwrap_or_default();
            manager
                .run(session, &request, &token)
                .await
                .inspect_err(|e| self.log_failure(Some(kind), e))?
        };

        self.log_result(&result);
        self.ctx.progress.on_finished(&result);
        Ok(DelegationOutcome::Executed { result })
    }

    /// Current view of an existing session. Never changes any state.
    pub async fn get_status(&self, reference: &SessionRef) -> Result<SessionSnapshot, DelegationError> {
        self.manager(reference.backend)?.status(reference).await
    }

    /// Approve a plan left waiting by a deferred approval.
    pub async fn approve(&self, reference: &SessionRef) -> Result<(), DelegationError> {
        self.manager(reference.backend)?.approve(reference).await?;
        self.logger.log(DelegationEvent::new(
            "plan_approved",
            json!({ "session": reference.to_string() }),
        ));
        Ok(())
    }

    /// Ask the backend to stop a session started earlier.
    pub async fn cancel(&self, reference: &SessionRef) -> Result<(), DelegationError> {
        self.manager(reference.backend)?.cancel(reference).await?;
        self.logger.log(DelegationEvent::new(
            "delegation_cancelled",
            json!({ "session": reference.to_string(), "requested_by": "caller" }),
        ));
        Ok(())
    }

    /// Availability of every backend family, for listings.
    pub async fn availability(&self) -> AvailabilityReport {
        self.cache.get().await
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    // ==================== Helpers ====================

    fn manager(&self, kind: BackendKind) -> Result<&Arc<dyn SessionManager>, DelegationError> {
        self.managers
            .get(&kind)
            .ok_or_else(|| DelegationError::Configuration {
                backend: kind,
                cause: "no session manager is registered for this backend".to_string(),
                remediation: None,
            })
    }

    /// Attach the simplest setup step to an unavailable forced backend.
    fn selection_error(&self, error: SelectionError, report: &AvailabilityReport) -> DelegationError {
        let mut error = DelegationError::from(error);
        if let DelegationError::Configuration {
            backend,
            remediation,
            ..
        } = &mut error
            && remediation.is_none()
        {
            let guide = generate_setup_guide(report, &self.hints);
            *remediation = guide
                .option(backend.family())
                .and_then(|option| option.steps.first())
                .map(|step| step.command.clone().unwrap_or_else(|| step.action.clone()));
        }
        error
    }

    fn log_failure(&self, backend: Option<BackendKind>, error: &DelegationError) {
        let event_type = if error.is_cancelled() {
            "delegation_cancelled"
        } else {
            "delegation_failed"
        };
        self.logger.log(DelegationEvent::new(
            event_type,
            json!({
                "backend": backend.or(error.backend()),
                "error": error.to_string(),
                "remediation": error.remediation(),
            }),
        ));
    }

    fn log_result(&self, result: &ExecutionResult) {
        let cancelled = result
            .error
            .as_ref()
            .is_some_and(|e| e.kind == ResultErrorKind::Cancelled);
        let event_type = if cancelled {
            "delegation_cancelled"
        } else {
            "delegation_finished"
        };
        info!(
            session = %result.session,
            state = %result.state,
            success = result.success,
            files = result.modified_files.len(),
            elapsed_secs = result.elapsed.as_secs_f64(),
            "Delegation finished"
        );
        self.logger.log(DelegationEvent::new(
            event_type,
            json!({
                "session": result.session.to_string(),
                "state": result.state,
                "success": result.success,
                "modified_files": result.modified_files,
                "elapsed_secs": result.elapsed.as_secs_f64(),
                "error": result.error.as_ref().map(|e| e.to_string()),
            }),
        ));
    }
}
