//! Remote API session manager.
//!
//! Drives an asynchronous remote session:
//!
//! 1. resolve the working directory to a registered source and create the session
//! 2. poll until the plan is waiting for approval or the session ends
//! 3. approve, reject or defer the plan
//! 4. poll until terminal, then walk the activity stream for files and log

use super::source::SourceResolver;
use super::{SessionContext, SessionManager};
use crate::ports::backend_error::BackendError;
use crate::ports::plan_approval::{ApprovalDecision, PlanApprovalError, PlanApprovalPort, PlanReview};
use crate::ports::remote_backend::{NewRemoteSession, RemoteSessionBackend};
use crate::ports::workspace::WorkspacePort;
use crate::use_cases::delegate_task::DelegationError;
use crate::use_cases::polling::{PollExit, PollSchedule, poll_until};
use crate::use_cases::shared::{CallError, cancel_with_grace, retry_transient};
use async_trait::async_trait;
use relay_domain::{
    Activity, ActivityKind, BackendKind, ExecutionResult, ResultError, ResultErrorKind, Session,
    SessionRef, SessionSnapshot, SessionState, TaskRequest, collect_modified_files,
    format_activity_log, map_status_word,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct RemoteSessionManager {
    backend: Arc<dyn RemoteSessionBackend>,
    resolver: SourceResolver,
    approval: Arc<dyn PlanApprovalPort>,
    ctx: SessionContext,
}

/// What the approval step decided for the running session.
enum ApprovalStep {
    Continue,
    Stop(ExecutionResult),
}

impl RemoteSessionManager {
    pub fn new(
        backend: Arc<dyn RemoteSessionBackend>,
        workspace: Arc<dyn WorkspacePort>,
        approval: Arc<dyn PlanApprovalPort>,
        ctx: SessionContext,
    ) -> Self {
        let resolver = SourceResolver::new(backend.clone(), workspace);
        Self {
            backend,
            resolver,
            approval,
            ctx,
        }
    }

    fn backend_error(e: impl std::fmt::Display) -> DelegationError {
        DelegationError::Backend {
            backend: BackendKind::RemoteApi,
            cause: e.to_string(),
        }
    }

    async fn fetch_activities(
        &self,
        id: &str,
        token: &CancellationToken,
    ) -> Result<Vec<Activity>, CallError> {
        retry_transient(
            &self.ctx.params.retry,
            self.ctx.clock.as_ref(),
            token,
            "list_activities",
            || self.backend.list_activities(id),
        )
        .await
    }

    /// Steps of the most recent generated plan.
    fn plan_steps(activities: &[Activity]) -> Vec<String> {
        activities
            .iter()
            .rev()
            .find_map(|a| match &a.kind {
                ActivityKind::PlanGenerated { steps } => Some(steps.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    async fn handle_plan(
        &self,
        session: &mut Session,
        request: &TaskRequest,
        started: Instant,
        token: &CancellationToken,
    ) -> ApprovalStep {
        let reference = session.reference().clone();
        let id = reference.id.clone();
        let steps = match self.fetch_activities(&id, token).await {
            Ok(activities) => Self::plan_steps(&activities),
            Err(e) => {
                warn!(session = %reference, error = ?e, "Could not fetch the plan, reviewing without steps");
                Vec::new()
            }
        };
        self.ctx.progress.on_plan_ready(&reference, &steps);

        let decision = if self.ctx.params.auto_approve {
            debug!(session = %reference, "Auto-approving plan");
            ApprovalDecision::Approve
        } else {
            let review = PlanReview {
                session: reference.clone(),
                prompt: request.prompt.clone(),
                steps,
            };
            let reviewed = tokio::select! {
                biased;
                _ = token.cancelled() => Err(PlanApprovalError::Cancelled),
                decision = self.approval.review_plan(&review) => decision,
            };
            match reviewed {
                Ok(decision) => decision,
                Err(PlanApprovalError::Cancelled) => {
                    return ApprovalStep::Stop(self.cancel_running(session, started).await);
                }
                Err(e) => {
                    warn!(session = %reference, error = %e, "Plan review failed, deferring");
                    ApprovalDecision::Defer
                }
            }
        };

        match decision {
            ApprovalDecision::Approve => {
                let approved = retry_transient(
                    &self.ctx.params.retry,
                    self.ctx.clock.as_ref(),
                    token,
                    "approve_plan",
                    || self.backend.approve_plan(&id),
                )
                .await;
                match approved {
                    Ok(()) => {
                        info!(session = %reference, "Plan approved");
                        self.ctx.advance(session, SessionState::Running);
                        ApprovalStep::Continue
                    }
                    Err(CallError::Cancelled) => {
                        ApprovalStep::Stop(self.cancel_running(session, started).await)
                    }
                    Err(CallError::Backend(e)) => ApprovalStep::Stop(self.ctx.failed(
                        session,
                        started,
                        format!("plan approval failed: {}", e),
                    )),
                }
            }
            ApprovalDecision::Reject => {
                info!(session = %reference, "Plan rejected");
                cancel_with_grace(
                    self.ctx.clock.as_ref(),
                    self.ctx.params.cancel_grace,
                    self.backend.cancel(&id),
                )
                .await;
                ApprovalStep::Stop(self.ctx.cancelled(session, started, "plan rejected"))
            }
            ApprovalDecision::Defer => {
                info!(session = %reference, "Plan approval deferred");
                ApprovalStep::Stop(
                    self.ctx.finish(session, started).with_error(
                        ResultError::new(
                            ResultErrorKind::ApprovalPending,
                            BackendKind::RemoteApi,
                            "the plan is waiting for approval",
                        )
                        .with_remediation(format!("agent-relay approve {}", reference)),
                    ),
                )
            }
        }
    }

    async fn cancel_running(&self, session: &mut Session, started: Instant) -> ExecutionResult {
        let id = session.reference().id.clone();
        let acknowledged = cancel_with_grace(
            self.ctx.clock.as_ref(),
            self.ctx.params.cancel_grace,
            self.backend.cancel(&id),
        )
        .await;
        debug!(session = %id, acknowledged, "Remote cancellation requested");
        self.ctx.cancelled(session, started, "cancelled by caller")
    }

    async fn finalize(
        &self,
        session: &mut Session,
        started: Instant,
        token: &CancellationToken,
    ) -> ExecutionResult {
        let id = session.reference().id.clone();
        let activities = self.fetch_activities(&id, token).await;

        let result = match session.state() {
            SessionState::Completed => self.ctx.finish(session, started),
            SessionState::Cancelled => {
                self.ctx.cancelled(session, started, "cancelled by the backend")
            }
            _ => self
                .ctx
                .failed(session, started, "the remote session failed"),
        };

        match activities {
            Ok(activities) => result
                .with_modified_files(collect_modified_files(&activities))
                .with_log_text(format_activity_log(&activities)),
            Err(e) => {
                let cause = match e {
                    CallError::Backend(e) => e.to_string(),
                    CallError::Cancelled => "cancelled".to_string(),
                };
                warn!(session = %id, error = %cause, "Could not fetch session activities");
                // A session that already failed keeps its own error.
                if result.error.is_some() {
                    return result;
                }
                result.with_error(
                    ResultError::new(
                        ResultErrorKind::Backend,
                        BackendKind::RemoteApi,
                        format!("could not fetch session activities: {}", cause),
                    )
                    .with_remediation(format!("agent-relay status {}", session.reference())),
                )
            }
        }
    }
}

#[async_trait]
impl SessionManager for RemoteSessionManager {
    fn kind(&self) -> BackendKind {
        BackendKind::RemoteApi
    }

    async fn create(&self, request: &TaskRequest) -> Result<Session, DelegationError> {
        let source = self.resolver.resolve(&request.working_dir).await?;
        let new_session = NewRemoteSession {
            prompt: request.prompt.clone(),
            source,
            branch: request.branch.clone(),
            require_plan_approval: request.needs_plan_approval,
        };

        let token = CancellationToken::new();
        let info = retry_transient(
            &self.ctx.params.retry,
            self.ctx.clock.as_ref(),
            &token,
            "create_session",
            || self.backend.create_session(&new_session),
        )
        .await
        .map_err(|e| {
            let cause = match e {
                CallError::Backend(e) => e.to_string(),
                CallError::Cancelled => "cancelled".to_string(),
            };
            DelegationError::SessionCreation {
                backend: BackendKind::RemoteApi,
                cause,
                remediation: None,
            }
        })?;

        let reference = SessionRef::new(BackendKind::RemoteApi, info.id)
            .with_working_dir(&request.working_dir);
        info!(session = %reference, source = %new_session.source, "Remote session created");
        self.ctx.progress.on_session_created(&reference);

        let mut session = Session::new(reference);
        if request.needs_plan_approval {
            self.ctx.advance(&mut session, SessionState::AwaitingApproval);
        }
        Ok(session)
    }

    async fn run(
        &self,
        mut session: Session,
        request: &TaskRequest,
        token: &CancellationToken,
    ) -> Result<ExecutionResult, DelegationError> {
        let started = self.ctx.clock.now();
        let id = session.reference().id.clone();
        let schedule = PollSchedule {
            clock: self.ctx.clock.as_ref(),
            interval: self.ctx.params.poll_interval,
            deadline: started + self.ctx.params.timeout,
            retry: &self.ctx.params.retry,
            token,
        };
        let mut plan_reviewed = false;

        loop {
            let ctx = &self.ctx;
            let backend = &self.backend;
            let id = id.as_str();
            let progress_ref = session.reference().clone();
            let exit = poll_until(
                &schedule,
                "get_session",
                || {
                    ctx.progress.on_poll(&progress_ref, ctx.clock.now() - started);
                    async move {
                        backend
                            .get_session(id)
                            .await
                            .map(|info| map_status_word(&info.state))
                    }
                },
                |state| {
                    ctx.advance(&mut session, state);
                    state.is_terminal()
                        || (state == SessionState::AwaitingApproval && !plan_reviewed)
                },
            )
            .await;

            match exit {
                PollExit::Reached(SessionState::AwaitingApproval) => {
                    plan_reviewed = true;
                    match self.handle_plan(&mut session, request, started, token).await {
                        ApprovalStep::Continue => continue,
                        ApprovalStep::Stop(result) => return Ok(result),
                    }
                }
                PollExit::Reached(_) => {
                    return Ok(self.finalize(&mut session, started, token).await);
                }
                PollExit::TimedOut => return Ok(self.ctx.timed_out(&mut session, started)),
                PollExit::Cancelled => return Ok(self.cancel_running(&mut session, started).await),
                PollExit::Failed(e) => {
                    return Ok(self.ctx.failed(
                        &mut session,
                        started,
                        format!("status polling failed: {}", e),
                    ));
                }
            }
        }
    }

    async fn status(&self, reference: &SessionRef) -> Result<SessionSnapshot, DelegationError> {
        let info = self
            .backend
            .get_session(&reference.id)
            .await
            .map_err(Self::backend_error)?;

        let Some(state) = map_status_word(&info.state) else {
            return Ok(SessionSnapshot::new(reference.clone(), SessionState::Running)
                .with_message(format!("unrecognized backend state {}", info.state)));
        };

        let mut snapshot = SessionSnapshot::new(reference.clone(), state);
        if state.is_terminal() {
            let activities = self
                .backend
                .list_activities(&reference.id)
                .await
                .map_err(Self::backend_error)?;
            snapshot = snapshot
                .with_modified_files(collect_modified_files(&activities))
                .with_log_text(format_activity_log(&activities));
        }
        if let Some(url) = info.url {
            snapshot = snapshot.with_message(url);
        }
        Ok(snapshot)
    }

    async fn cancel(&self, reference: &SessionRef) -> Result<(), DelegationError> {
        self.backend
            .cancel(&reference.id)
            .await
            .map_err(Self::backend_error)
    }

    async fn approve(&self, reference: &SessionRef) -> Result<(), DelegationError> {
        self.backend
            .approve_plan(&reference.id)
            .await
            .map_err(|e| match e {
                BackendError::NotFound(_) => DelegationError::Resolution {
                    backend: BackendKind::RemoteApi,
                    cause: format!("session {} not found", reference),
                    remediation: None,
                },
                other => Self::backend_error(other),
            })
    }
}
