//! Scripted port doubles shared by the use case tests.

use crate::ports::availability_probe::AvailabilityProbe;
use crate::ports::backend_error::{BackendError, WorkspaceError};
use crate::ports::delegation_logger::{DelegationEvent, DelegationLogger};
use crate::ports::local_backend::{LocalCliBackend, SpawnOutcome};
use crate::ports::plan_approval::{ApprovalDecision, PlanApprovalError, PlanApprovalPort, PlanReview};
use crate::ports::progress::DelegationProgress;
use crate::ports::remote_backend::{
    NewRemoteSession, RemoteSessionBackend, RemoteSessionInfo, RemoteSource,
};
use crate::ports::workspace::{WorkspacePort, WorkspaceSnapshot};
use async_trait::async_trait;
use relay_domain::{
    Activity, BackendAvailability, BackendFamily, BackendKind, ProbeDetails, SelectionReason,
    SessionRef, SessionState,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pops scripted values in order; the last one repeats forever.
struct Script<T: Clone> {
    items: Mutex<VecDeque<T>>,
}

impl<T: Clone> Script<T> {
    fn new(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items.into()),
        }
    }

    fn next(&self) -> Option<T> {
        let mut items = self.items.lock().unwrap();
        if items.len() > 1 {
            items.pop_front()
        } else {
            items.front().cloned()
        }
    }
}

// ==================== Remote ====================

pub(crate) struct MockRemote {
    sources: Vec<RemoteSource>,
    states: Script<Result<String, BackendError>>,
    activities: Vec<Activity>,
    activities_error: Option<BackendError>,
    create_error: Option<BackendError>,
    hang_polls: bool,
    hang_cancel: bool,
    pub created: Mutex<Vec<NewRemoteSession>>,
    list_sources_calls: AtomicUsize,
    get_calls: AtomicUsize,
    approve_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            states: Script::new(vec![Ok("IN_PROGRESS".to_string())]),
            activities: Vec::new(),
            activities_error: None,
            create_error: None,
            hang_polls: false,
            hang_cancel: false,
            created: Mutex::new(Vec::new()),
            list_sources_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            approve_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_sources(mut self, sources: Vec<RemoteSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_states(mut self, states: &[&str]) -> Self {
        self.states = Script::new(states.iter().map(|s| Ok(s.to_string())).collect());
        self
    }

    pub fn with_state_results(mut self, states: Vec<Result<String, BackendError>>) -> Self {
        self.states = Script::new(states);
        self
    }

    pub fn with_activities(mut self, activities: Vec<Activity>) -> Self {
        self.activities = activities;
        self
    }

    pub fn with_activities_error(mut self, error: BackendError) -> Self {
        self.activities_error = Some(error);
        self
    }

    pub fn with_create_error(mut self, error: BackendError) -> Self {
        self.create_error = Some(error);
        self
    }

    pub fn hanging_polls(mut self) -> Self {
        self.hang_polls = true;
        self
    }

    pub fn hanging_cancel(mut self) -> Self {
        self.hang_cancel = true;
        self
    }

    pub fn list_sources_calls(&self) -> usize {
        self.list_sources_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn approve_calls(&self) -> usize {
        self.approve_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.list_sources_calls()
            + self.get_calls()
            + self.approve_calls()
            + self.cancel_calls()
            + self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteSessionBackend for MockRemote {
    async fn list_sources(&self) -> Result<Vec<RemoteSource>, BackendError> {
        self.list_sources_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sources.clone())
    }

    async fn create_session(
        &self,
        request: &NewRemoteSession,
    ) -> Result<RemoteSessionInfo, BackendError> {
        self.created.lock().unwrap().push(request.clone());
        if let Some(error) = &self.create_error {
            return Err(error.clone());
        }
        Ok(RemoteSessionInfo {
            id: "1234".to_string(),
            state: "QUEUED".to_string(),
            url: Some("https://jules.google/session/1234".to_string()),
            title: None,
        })
    }

    async fn get_session(&self, id: &str) -> Result<RemoteSessionInfo, BackendError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_polls {
            std::future::pending::<()>().await;
        }
        let state = self
            .states
            .next()
            .unwrap_or_else(|| Ok("IN_PROGRESS".to_string()))?;
        Ok(RemoteSessionInfo {
            id: id.to_string(),
            state,
            url: None,
            title: None,
        })
    }

    async fn list_activities(&self, _id: &str) -> Result<Vec<Activity>, BackendError> {
        if let Some(error) = &self.activities_error {
            return Err(error.clone());
        }
        Ok(self.activities.clone())
    }

    async fn approve_plan(&self, _id: &str) -> Result<(), BackendError> {
        self.approve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel(&self, _id: &str) -> Result<(), BackendError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_cancel {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

// ==================== Local CLI ====================

pub(crate) struct MockLocal {
    spawn_output: Result<SpawnOutcome, BackendError>,
    statuses: Script<Result<String, BackendError>>,
    pulled: Vec<PathBuf>,
    pub spawned_headless: Mutex<Vec<bool>>,
    poll_calls: AtomicUsize,
    pull_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl MockLocal {
    pub fn new() -> Self {
        Self {
            spawn_output: Ok(SpawnOutcome {
                session_id: Some("abc123".to_string()),
                output: "Session created: abc123".to_string(),
            }),
            statuses: Script::new(vec![Ok("Status: RUNNING".to_string())]),
            pulled: Vec::new(),
            spawned_headless: Mutex::new(Vec::new()),
            poll_calls: AtomicUsize::new(0),
            pull_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_spawn(mut self, output: Result<SpawnOutcome, BackendError>) -> Self {
        self.spawn_output = output;
        self
    }

    pub fn with_statuses(mut self, statuses: &[&str]) -> Self {
        self.statuses = Script::new(statuses.iter().map(|s| Ok(s.to_string())).collect());
        self
    }

    pub fn with_pulled(mut self, paths: &[&str]) -> Self {
        self.pulled = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalCliBackend for MockLocal {
    async fn spawn(
        &self,
        _prompt: &str,
        _working_dir: &Path,
        headless: bool,
    ) -> Result<SpawnOutcome, BackendError> {
        self.spawned_headless.lock().unwrap().push(headless);
        self.spawn_output.clone()
    }

    async fn poll_status(&self, _session_id: &str) -> Result<String, BackendError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .next()
            .unwrap_or_else(|| Ok("Status: RUNNING".to_string()))
    }

    async fn pull_and_apply(
        &self,
        _session_id: &str,
        _working_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pulled.clone())
    }

    async fn cancel(&self, _session_id: &str) -> Result<(), BackendError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<String, BackendError> {
        Ok(String::new())
    }
}

// ==================== Workspace ====================

pub(crate) struct MockWorkspace {
    is_repository: bool,
    remote_url: Option<String>,
    cache: Mutex<Option<String>>,
    snapshots: Script<WorkspaceSnapshot>,
    snapshot_calls: AtomicUsize,
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self {
            is_repository: true,
            remote_url: None,
            cache: Mutex::new(None),
            snapshots: Script::new(vec![WorkspaceSnapshot::default()]),
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    pub fn not_a_repository(mut self) -> Self {
        self.is_repository = false;
        self
    }

    pub fn with_remote_url(mut self, url: &str) -> Self {
        self.remote_url = Some(url.to_string());
        self
    }

    pub fn with_cached_source(self, source: &str) -> Self {
        *self.cache.lock().unwrap() = Some(source.to_string());
        self
    }

    pub fn with_snapshots(mut self, snapshots: Vec<WorkspaceSnapshot>) -> Self {
        self.snapshots = Script::new(snapshots);
        self
    }

    pub fn cached_source(&self) -> Option<String> {
        self.cache.lock().unwrap().clone()
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkspacePort for MockWorkspace {
    async fn is_repository(&self, _dir: &Path) -> bool {
        self.is_repository
    }

    async fn git_remote_url(&self, _dir: &Path) -> Result<Option<String>, WorkspaceError> {
        Ok(self.remote_url.clone())
    }

    async fn read_source_cache(&self, _dir: &Path) -> Result<Option<String>, WorkspaceError> {
        Ok(self.cache.lock().unwrap().clone())
    }

    async fn write_source_cache(&self, _dir: &Path, source: &str) -> Result<(), WorkspaceError> {
        *self.cache.lock().unwrap() = Some(source.to_string());
        Ok(())
    }

    async fn snapshot(&self, _dir: &Path) -> Result<WorkspaceSnapshot, WorkspaceError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshots.next().unwrap_or_default())
    }
}

// ==================== Probe ====================

/// Fixed availability per family; counts probes per family.
pub(crate) struct StaticProbe {
    remote: BackendAvailability,
    local: BackendAvailability,
    pub remote_probes: AtomicUsize,
    pub local_probes: AtomicUsize,
}

impl StaticProbe {
    pub fn new(remote: bool, local: bool) -> Self {
        let remote = if remote {
            BackendAvailability::available(ProbeDetails {
                credential_present: Some(true),
                client_installed: Some(true),
                ..Default::default()
            })
        } else {
            BackendAvailability::unavailable(
                "JULES_API_KEY not set",
                ProbeDetails {
                    credential_present: Some(false),
                    client_installed: Some(true),
                    ..Default::default()
                },
            )
        };
        let local = if local {
            BackendAvailability::available(ProbeDetails {
                binary_installed: Some(true),
                logged_in: Some(true),
                ..Default::default()
            })
        } else {
            BackendAvailability::unavailable(
                "login required (run: jules login): not authenticated",
                ProbeDetails {
                    binary_installed: Some(true),
                    logged_in: Some(false),
                    ..Default::default()
                },
            )
        };
        Self {
            remote,
            local,
            remote_probes: AtomicUsize::new(0),
            local_probes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AvailabilityProbe for StaticProbe {
    async fn probe_family(&self, family: BackendFamily) -> BackendAvailability {
        match family {
            BackendFamily::Remote => {
                self.remote_probes.fetch_add(1, Ordering::SeqCst);
                self.remote.clone()
            }
            BackendFamily::Local => {
                self.local_probes.fetch_add(1, Ordering::SeqCst);
                self.local.clone()
            }
        }
    }
}

// ==================== Approval / Progress ====================

pub(crate) struct FixedApproval {
    decision: ApprovalDecision,
    pub reviews: Mutex<Vec<PlanReview>>,
}

impl FixedApproval {
    pub fn new(decision: ApprovalDecision) -> Self {
        Self {
            decision,
            reviews: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PlanApprovalPort for FixedApproval {
    async fn review_plan(&self, review: &PlanReview) -> Result<ApprovalDecision, PlanApprovalError> {
        self.reviews.lock().unwrap().push(review.clone());
        Ok(self.decision)
    }
}

#[derive(Default)]
pub(crate) struct RecordingProgress {
    pub selected: Mutex<Vec<BackendKind>>,
    pub transitions: Mutex<Vec<(SessionState, SessionState)>>,
}

impl DelegationProgress for RecordingProgress {
    fn on_backend_selected(&self, kind: BackendKind, _reason: SelectionReason) {
        self.selected.lock().unwrap().push(kind);
    }

    fn on_session_created(&self, _session: &SessionRef) {}

    fn on_state_change(&self, _session: &SessionRef, from: SessionState, to: SessionState) {
        self.transitions.lock().unwrap().push((from, to));
    }
}

#[derive(Default)]
pub(crate) struct RecordingLogger {
    pub events: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl DelegationLogger for RecordingLogger {
    fn log(&self, event: DelegationEvent) {
        self.events.lock().unwrap().push(event.event_type.to_string());
    }
}
