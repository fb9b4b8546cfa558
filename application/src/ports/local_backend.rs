//! Local command-line backend port
//!
//! The local tool is driven through its textual command surface; parsing of
//! status text happens in the caller, parsing of session ids in the adapter.

use super::backend_error::BackendError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// What a `spawn` call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOutcome {
    /// Session id parsed from the tool's output. Interactive runs may have none.
    pub session_id: Option<String>,
    /// Captured output (empty for interactive runs).
    pub output: String,
}

/// Local command-surface backend.
#[async_trait]
pub trait LocalCliBackend: Send + Sync {
    /// Start a session. Headless runs return once the session is registered;
    /// interactive runs return when the user exits the tool.
    async fn spawn(
        &self,
        prompt: &str,
        working_dir: &Path,
        headless: bool,
    ) -> Result<SpawnOutcome, BackendError>;

    /// Raw status output for one session.
    async fn poll_status(&self, session_id: &str) -> Result<String, BackendError>;

    /// Pull the session's result into `working_dir`, returning the paths the
    /// tool reports as changed (relative to `working_dir` when possible).
    async fn pull_and_apply(
        &self,
        session_id: &str,
        working_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError>;

    async fn cancel(&self, session_id: &str) -> Result<(), BackendError>;

    /// Raw session listing; also used as the login probe.
    async fn list_sessions(&self) -> Result<String, BackendError>;
}
