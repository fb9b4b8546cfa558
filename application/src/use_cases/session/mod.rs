//! Session managers, one per backend kind.
//!
//! Every manager implements the same [`SessionManager`] contract; what
//! differs is how it talks to its backend:
//!
//! - [`remote::RemoteSessionManager`]: structured API, source resolution, plan approval
//! - [`local_headless::LocalHeadlessSessionManager`]: textual CLI output, working-tree diff
//! - [`local_interactive::LocalInteractiveSessionManager`]: hands the terminal to a human

pub mod local_headless;
pub mod local_interactive;
pub mod remote;
pub mod source;

use super::delegate_task::DelegationError;
use crate::config::DelegationParams;
use crate::ports::clock::Clock;
use crate::ports::progress::{DelegationProgress, NoProgress};
use async_trait::async_trait;
use relay_domain::{
    BackendKind, ExecutionResult, ResultError, ResultErrorKind, Session, SessionRef,
    SessionSnapshot, SessionState, TaskRequest,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shared contract for driving one unit of delegated work.
#[async_trait]
pub trait SessionManager: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Establish the session with the backend.
    ///
    /// Structural failures (unresolvable source, missing repository) are
    /// returned as errors and never retried.
    async fn create(&self, request: &TaskRequest) -> Result<Session, DelegationError>;

    /// Drive a created session until it ends, times out, is cancelled, or
    /// waits on a deferred approval.
    async fn run(
        &self,
        session: Session,
        request: &TaskRequest,
        token: &CancellationToken,
    ) -> Result<ExecutionResult, DelegationError>;

    /// Current view of a session. Never changes backend or working-tree state.
    async fn status(&self, reference: &SessionRef) -> Result<SessionSnapshot, DelegationError>;

    /// Best-effort cancellation request.
    async fn cancel(&self, reference: &SessionRef) -> Result<(), DelegationError>;

    /// Approve a plan that was left waiting.
    async fn approve(&self, reference: &SessionRef) -> Result<(), DelegationError>;
}

/// Collaborators every manager needs besides its backend.
#[derive(Clone)]
pub struct SessionContext {
    pub clock: Arc<dyn Clock>,
    pub params: DelegationParams,
    pub progress: Arc<dyn DelegationProgress>,
}

impl SessionContext {
    pub fn new(clock: Arc<dyn Clock>, params: DelegationParams) -> Self {
        Self {
            clock,
            params,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn DelegationProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Apply a backend-reported state.
    ///
    /// Backends may repeat or briefly report an earlier state; anything that
    /// is not a legal forward move is ignored.
    pub(crate) fn advance(&self, session: &mut Session, next: SessionState) -> bool {
        let from = session.state();
        if from == next {
            return false;
        }
        match session.transition(next) {
            Ok(()) => {
                debug!(session = %session.reference(), %from, to = %next, "Session state changed");
                self.progress.on_state_change(session.reference(), from, next);
                true
            }
            Err(e) => {
                debug!(session = %session.reference(), error = %e, "Ignoring reported state");
                false
            }
        }
    }

    /// Build the result for a session that stopped waiting.
    pub(crate) fn finish(&self, session: &Session, started: Instant) -> ExecutionResult {
        ExecutionResult::new(
            session.reference().clone(),
            session.state(),
            self.clock.now().saturating_duration_since(started),
        )
        .with_history(session.history().to_vec())
    }

    /// Result for a session left running in the background.
    ///
    /// A detached launch counts as successful once the backend accepted it.
    pub(crate) fn detached(&self, mut session: Session, started: Instant) -> ExecutionResult {
        if session.state() == SessionState::Created {
            self.advance(&mut session, SessionState::Running);
        }
        let mut result = self.finish(&session, started);
        result.success = true;
        result
    }

    pub(crate) fn timed_out(&self, session: &mut Session, started: Instant) -> ExecutionResult {
        self.advance(session, SessionState::TimedOut);
        let reference = session.reference().clone();
        self.finish(session, started).with_error(
            ResultError::new(
                ResultErrorKind::Timeout,
                reference.backend,
                format!(
                    "no terminal state within {}s; the session may still be running",
                    self.params.timeout.as_secs()
                ),
            )
            .with_remediation(format!("check later: agent-relay status {}", reference)),
        )
    }

    pub(crate) fn cancelled(
        &self,
        session: &mut Session,
        started: Instant,
        message: &str,
    ) -> ExecutionResult {
        self.advance(session, SessionState::Cancelled);
        let backend = session.reference().backend;
        self.finish(session, started).with_error(ResultError::new(
            ResultErrorKind::Cancelled,
            backend,
            message,
        ))
    }

    pub(crate) fn failed(
        &self,
        session: &mut Session,
        started: Instant,
        message: impl Into<String>,
    ) -> ExecutionResult {
        self.advance(session, SessionState::Failed);
        let backend = session.reference().backend;
        self.finish(session, started).with_error(ResultError::new(
            ResultErrorKind::Backend,
            backend,
            message,
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_support;
