//! Local CLI session manager (interactive).
//!
//! Hands the terminal to a human. The session is reported `HANDED_OFF` as
//! soon as the CLI is launched; nothing is polled and no files are tracked.

use super::{SessionContext, SessionManager};
use crate::ports::local_backend::LocalCliBackend;
use crate::use_cases::delegate_task::DelegationError;
use async_trait::async_trait;
use relay_domain::{
    BackendKind, ExecutionResult, ResultError, ResultErrorKind, Session, SessionRef,
    SessionSnapshot, SessionState, TaskRequest,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::info;

const HANDOFF_MESSAGE: &str = "the session was handed to an interactive terminal; its outcome is not tracked";

pub struct LocalInteractiveSessionManager {
    backend: Arc<dyn LocalCliBackend>,
    ctx: SessionContext,
}

impl LocalInteractiveSessionManager {
    pub fn new(backend: Arc<dyn LocalCliBackend>, ctx: SessionContext) -> Self {
        Self { backend, ctx }
    }

    fn session_id() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("interactive-{}", millis)
    }
}

#[async_trait]
impl SessionManager for LocalInteractiveSessionManager {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalInteractive
    }

    async fn create(&self, request: &TaskRequest) -> Result<Session, DelegationError> {
        let reference = SessionRef::new(BackendKind::LocalInteractive, Self::session_id())
            .with_working_dir(&request.working_dir);
        self.ctx.progress.on_session_created(&reference);
        Ok(Session::new(reference))
    }

    async fn run(
        &self,
        mut session: Session,
        request: &TaskRequest,
        token: &CancellationToken,
    ) -> Result<ExecutionResult, DelegationError> {
        let started = self.ctx.clock.now();
        self.ctx.advance(&mut session, SessionState::HandedOff);
        info!(session = %session.reference(), "Handing off to interactive CLI");

        let spawned = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            spawned = self.backend.spawn(&request.prompt, &request.working_dir, false) => Some(spawned),
        };

        match spawned {
            None => Ok(self.ctx.finish(&session, started).with_error(ResultError::new(
                ResultErrorKind::Cancelled,
                BackendKind::LocalInteractive,
                "cancelled before the interactive session ended",
            ))),
            Some(Err(e)) => Err(DelegationError::Backend {
                backend: BackendKind::LocalInteractive,
                cause: e.to_string(),
            }),
            Some(Ok(outcome)) => Ok(self
                .ctx
                .finish(&session, started)
                .with_log_text(outcome.output)),
        }
    }

    async fn status(&self, reference: &SessionRef) -> Result<SessionSnapshot, DelegationError> {
        Ok(SessionSnapshot::new(reference.clone(), SessionState::HandedOff)
            .with_message(HANDOFF_MESSAGE))
    }

    async fn cancel(&self, _reference: &SessionRef) -> Result<(), DelegationError> {
        Ok(())
    }

    async fn approve(&self, _reference: &SessionRef) -> Result<(), DelegationError> {
        Err(DelegationError::PlanApprovalUnsupported {
            backend: BackendKind::LocalInteractive,
        })
    }
}
