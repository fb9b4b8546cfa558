//! Local CLI session manager (headless).
//!
//! The CLI reports progress as free text, so every status is parsed with
//! [`parse_status_text`]. Modified files are the files the CLI reports as
//! applied, restricted to what actually changed in the working tree between
//! session creation and completion.

use super::{SessionContext, SessionManager};
use crate::ports::local_backend::LocalCliBackend;
use crate::ports::workspace::{WorkspacePort, WorkspaceSnapshot};
use crate::use_cases::delegate_task::DelegationError;
use crate::use_cases::polling::{PollExit, PollSchedule, poll_until};
use crate::use_cases::shared::{CallError, cancel_with_grace, retry_transient};
use async_trait::async_trait;
use relay_domain::{
    BackendKind, ExecutionResult, ResultError, ResultErrorKind, Session, SessionRef,
    SessionSnapshot, SessionState, TaskRequest, parse_status_text,
};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct LocalHeadlessSessionManager {
    backend: Arc<dyn LocalCliBackend>,
    workspace: Arc<dyn WorkspacePort>,
    ctx: SessionContext,
    /// Working-tree state captured at creation, keyed by session id.
    baselines: Mutex<HashMap<String, WorkspaceSnapshot>>,
}

impl LocalHeadlessSessionManager {
    pub fn new(
        backend: Arc<dyn LocalCliBackend>,
        workspace: Arc<dyn WorkspacePort>,
        ctx: SessionContext,
    ) -> Self {
        Self {
            backend,
            workspace,
            ctx,
            baselines: Mutex::new(HashMap::new()),
        }
    }

    fn creation_error(cause: impl Into<String>, remediation: Option<&str>) -> DelegationError {
        DelegationError::SessionCreation {
            backend: BackendKind::LocalHeadless,
            cause: cause.into(),
            remediation: remediation.map(str::to_string),
        }
    }

    fn take_baseline(&self, id: &str) -> Option<WorkspaceSnapshot> {
        self.baselines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }

    /// Pull the finished session into the working tree and work out what changed.
    async fn apply_results(
        &self,
        session: &mut Session,
        dir: &Path,
        baseline: Option<WorkspaceSnapshot>,
        started: Instant,
        token: &CancellationToken,
    ) -> ExecutionResult {
        let id = session.reference().id.clone();
        let pulled = retry_transient(
            &self.ctx.params.retry,
            self.ctx.clock.as_ref(),
            token,
            "pull",
            || self.backend.pull_and_apply(&id, dir),
        )
        .await;

        let reported = match pulled {
            Ok(paths) => paths,
            Err(CallError::Cancelled) => Vec::new(),
            Err(CallError::Backend(e)) => {
                // The backend finished but the result never reached the tree.
                return self.ctx.finish(session, started).with_error(ResultError::new(
                    ResultErrorKind::Backend,
                    BackendKind::LocalHeadless,
                    format!("could not apply session results: {}", e),
                ));
            }
        };

        let changed = match (baseline, self.workspace.snapshot(dir).await) {
            (Some(before), Ok(after)) => {
                match self.workspace.changed_between(dir, &before, &after).await {
                    Ok(changed) => Some(changed),
                    Err(e) => {
                        warn!(error = %e, "Could not diff working tree");
                        None
                    }
                }
            }
            (_, Err(e)) => {
                warn!(error = %e, "Could not snapshot working tree after pull");
                None
            }
            (None, Ok(_)) => None,
        };

        let files = modified_files(dir, &reported, changed.as_ref());
        info!(session = %id, files = files.len(), "Applied local session results");
        self.ctx.finish(session, started).with_modified_files(files)
    }
}

/// Reported paths relative to `dir`, kept only if the tree changed there.
///
/// Without a usable report the tree diff itself is the answer.
fn modified_files(
    dir: &Path,
    reported: &[PathBuf],
    changed: Option<&BTreeSet<PathBuf>>,
) -> BTreeSet<PathBuf> {
    let reported: BTreeSet<PathBuf> = reported
        .iter()
        .map(|p| p.strip_prefix(dir).map(Path::to_path_buf).unwrap_or_else(|_| p.clone()))
        .collect();

    match changed {
        Some(changed) if reported.is_empty() => changed.clone(),
        Some(changed) => reported.intersection(changed).cloned().collect(),
        None => BTreeSet::new(),
    }
}

#[async_trait]
impl SessionManager for LocalHeadlessSessionManager {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalHeadless
    }

    async fn create(&self, request: &TaskRequest) -> Result<Session, DelegationError> {
        let dir = request.working_dir.as_path();
        if !self.workspace.is_repository(dir).await {
            return Err(Self::creation_error(
                format!("{} is not a git repository", dir.display()),
                Some("git init"),
            ));
        }

        // Detached sessions are never run to completion here, so nothing
        // would ever collect their baseline.
        let baseline = if request.detached {
            None
        } else {
            let snapshot = self
                .workspace
                .snapshot(dir)
                .await
                .map_err(|e| Self::creation_error(e.to_string(), None))?;
            Some(snapshot)
        };

        let outcome = self
            .backend
            .spawn(&request.prompt, dir, true)
            .await
            .map_err(|e| Self::creation_error(e.to_string(), None))?;

        let Some(id) = outcome.session_id else {
            return Err(Self::creation_error(
                "could not find a session id in the CLI output",
                None,
            ));
        };

        if let Some(baseline) = baseline {
            self.baselines
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(id.clone(), baseline);
        }

        let reference = SessionRef::new(BackendKind::LocalHeadless, id).with_working_dir(dir);
        info!(session = %reference, "Local session created");
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
        let id = session.reference().id.clone();
        let baseline = self.take_baseline(&id);
        let schedule = PollSchedule {
            clock: self.ctx.clock.as_ref(),
            interval: self.ctx.params.poll_interval,
            deadline: started + self.ctx.params.timeout,
            retry: &self.ctx.params.retry,
            token,
        };

        let last_output = Mutex::new(String::new());
        let exit = {
            let ctx = &self.ctx;
            let backend = &self.backend;
            let last_output = &last_output;
            let id = id.as_str();
            let progress_ref = session.reference().clone();
            poll_until(
                &schedule,
                "status",
                || {
                    ctx.progress.on_poll(&progress_ref, ctx.clock.now() - started);
                    async move {
                        backend.poll_status(id).await.map(|output| {
                            let state = parse_status_text(&output);
                            *last_output.lock().unwrap_or_else(|e| e.into_inner()) = output;
                            state
                        })
                    }
                },
                |state| {
                    ctx.advance(&mut session, state);
                    state.is_terminal()
                },
            )
            .await
        };
        let log_text = last_output.into_inner().unwrap_or_else(|e| e.into_inner());

        let result = match exit {
            PollExit::Reached(SessionState::Completed) => {
                self.apply_results(&mut session, &request.working_dir, baseline, started, token)
                    .await
            }
            PollExit::Reached(SessionState::Cancelled) => {
                self.ctx
                    .cancelled(&mut session, started, "cancelled by the CLI")
            }
            PollExit::Reached(_) => self
                .ctx
                .failed(&mut session, started, "the CLI session failed"),
            PollExit::TimedOut => self.ctx.timed_out(&mut session, started),
            PollExit::Cancelled => {
                let acknowledged = cancel_with_grace(
                    self.ctx.clock.as_ref(),
                    self.ctx.params.cancel_grace,
                    self.backend.cancel(&id),
                )
                .await;
                debug!(session = %id, acknowledged, "Local cancellation requested");
                self.ctx
                    .cancelled(&mut session, started, "cancelled by caller")
            }
            PollExit::Failed(e) => self.ctx.failed(
                &mut session,
                started,
                format!("status polling failed: {}", e),
            ),
        };
        Ok(result.with_log_text(log_text))
    }

    async fn status(&self, reference: &SessionRef) -> Result<SessionSnapshot, DelegationError> {
        let output = self
            .backend
            .poll_status(&reference.id)
            .await
            .map_err(|e| DelegationError::Backend {
                backend: BackendKind::LocalHeadless,
                cause: e.to_string(),
            })?;

        let snapshot = match parse_status_text(&output) {
            Some(state) => SessionSnapshot::new(reference.clone(), state),
            None => SessionSnapshot::new(reference.clone(), SessionState::Running)
                .with_message("status could not be determined from CLI output"),
        };
        Ok(snapshot.with_log_text(output))
    }

    async fn cancel(&self, reference: &SessionRef) -> Result<(), DelegationError> {
        self.backend
            .cancel(&reference.id)
            .await
            .map_err(|e| DelegationError::Backend {
                backend: BackendKind::LocalHeadless,
                cause: e.to_string(),
            })
    }

    async fn approve(&self, _reference: &SessionRef) -> Result<(), DelegationError> {
        Err(DelegationError::PlanApprovalUnsupported {
            backend: BackendKind::LocalHeadless,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DelegationParams;
    use crate::ports::clock::ManualClock;
    use crate::use_cases::session::test_support::{MockLocal, MockWorkspace};
    use std::time::Duration;

    fn manager(local: MockLocal, workspace: MockWorkspace) -> (Arc<MockLocal>, LocalHeadlessSessionManager) {
        let local = Arc::new(local);
        let params = DelegationParams::default()
            .with_poll_interval(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(10));
        let ctx = SessionContext::new(Arc::new(ManualClock::new()), params);
        let manager = LocalHeadlessSessionManager::new(local.clone(), Arc::new(workspace), ctx);
        (local, manager)
    }

    fn request() -> TaskRequest {
        TaskRequest::new("fix the typo in README", "/work/api")
    }

    fn snapshots() -> Vec<WorkspaceSnapshot> {
        vec![
            WorkspaceSnapshot::new(Some("abc".to_string()))
                .with_entry("src/a.rs", "1")
                .with_entry("src/b.rs", "1"),
            WorkspaceSnapshot::new(Some("abc".to_string()))
                .with_entry("src/a.rs", "2")
                .with_entry("src/b.rs", "2")
                .with_entry("src/c.rs", "1"),
        ]
    }

    async fn drive(manager: &LocalHeadlessSessionManager) -> ExecutionResult {
        let request = request();
        let session = manager.create(&request).await.unwrap();
        manager
            .run(session, &request, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[test]
    fn test_modified_files_is_subset_of_diff() {
        let changed: BTreeSet<PathBuf> = ["src/a.rs", "src/c.rs"].iter().map(PathBuf::from).collect();
        let reported = vec![
            PathBuf::from("/work/api/src/a.rs"),
            PathBuf::from("README.md"),
        ];
        let files = modified_files(Path::new("/work/api"), &reported, Some(&changed));
        assert_eq!(files, BTreeSet::from([PathBuf::from("src/a.rs")]));
        assert!(files.is_subset(&changed));

        let files = modified_files(Path::new("/work/api"), &[], Some(&changed));
        assert_eq!(files, changed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requires_repository() {
        let (local, manager) = manager(MockLocal::new(), MockWorkspace::new().not_a_repository());
        let err = manager.create(&request()).await.unwrap_err();

        assert!(matches!(err, DelegationError::SessionCreation { .. }));
        assert_eq!(err.remediation().as_deref(), Some("git init"));
        assert!(local.spawned_headless.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_session_restricts_files_to_diff() {
        let (local, manager) = manager(
            MockLocal::new()
                .with_statuses(&["Status: RUNNING", "Status: COMPLETED"])
                .with_pulled(&["src/a.rs", "/work/api/src/b.rs", "README.md"]),
            MockWorkspace::new().with_snapshots(snapshots()),
        );
        let result = drive(&manager).await;

        assert!(result.success);
        assert_eq!(
            result.modified_files,
            BTreeSet::from([PathBuf::from("src/a.rs"), PathBuf::from("src/b.rs")])
        );
        assert_eq!(result.log_text, "Status: COMPLETED");
        assert_eq!(local.pull_calls(), 1);
        assert_eq!(*local.spawned_headless.lock().unwrap(), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_is_released_after_run() {
        let (_, manager) = manager(
            MockLocal::new().with_statuses(&["Status: COMPLETED"]),
            MockWorkspace::new().with_snapshots(snapshots()),
        );
        let request = request();
        let session = manager.create(&request).await.unwrap();
        assert_eq!(manager.baselines.lock().unwrap().len(), 1);

        manager
            .run(session, &request, &CancellationToken::new())
            .await
            .unwrap();
        assert!(manager.baselines.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_session_keeps_no_baseline() {
        let (_, manager) = manager(MockLocal::new(), MockWorkspace::new().with_snapshots(snapshots()));
        let request = request().detached();

        for _ in 0..3 {
            manager.create(&request).await.unwrap();
        }
        assert!(manager.baselines.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_session_does_not_pull() {
        let (local, manager) = manager(
            MockLocal::new().with_statuses(&["Status: FAILED"]),
            MockWorkspace::new(),
        );
        let result = drive(&manager).await;

        assert_eq!(result.state, SessionState::Failed);
        assert!(!result.success);
        assert_eq!(local.pull_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_times_out() {
        let (local, manager) = manager(MockLocal::new(), MockWorkspace::new());
        let result = drive(&manager).await;

        assert_eq!(result.state, SessionState::TimedOut);
        assert_eq!(result.session.id, "abc123");
        assert!(local.poll_calls() >= 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_never_pulls() {
        let (local, manager) = manager(
            MockLocal::new().with_statuses(&["Status: COMPLETED"]),
            MockWorkspace::new(),
        );
        let reference = SessionRef::new(BackendKind::LocalHeadless, "abc123");
        let first = manager.status(&reference).await.unwrap();
        let second = manager.status(&reference).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.state, SessionState::Completed);
        assert_eq!(local.pull_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_approve_is_unsupported() {
        let (_, manager) = manager(MockLocal::new(), MockWorkspace::new());
        let reference = SessionRef::new(BackendKind::LocalHeadless, "abc123");
        let err = manager.approve(&reference).await.unwrap_err();
        assert!(matches!(err, DelegationError::PlanApprovalUnsupported { .. }));
    }
}
