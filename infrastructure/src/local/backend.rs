//! [`LocalCliBackend`] over the `jules` command line.

use super::parse::{parse_reported_paths, parse_session_id};
use super::runner::CliRunner;
use async_trait::async_trait;
use relay_application::{BackendError, LocalCliBackend, SpawnOutcome};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const SPAWN_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const PULL_TIMEOUT: Duration = Duration::from_secs(60);

pub struct CommandLocalBackend {
    runner: CliRunner,
    status_timeout: Duration,
}

impl CommandLocalBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            runner: CliRunner::new(binary),
            status_timeout: STATUS_TIMEOUT,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }
}

#[async_trait]
impl LocalCliBackend for CommandLocalBackend {
    async fn spawn(
        &self,
        prompt: &str,
        working_dir: &Path,
        headless: bool,
    ) -> Result<SpawnOutcome, BackendError> {
        let args = ["new", prompt];
        if !headless {
            info!(binary = self.runner.binary(), "Attaching interactive CLI");
            self.runner.attached(&args, Some(working_dir)).await?;
            return Ok(SpawnOutcome {
                session_id: None,
                output: String::new(),
            });
        }

        let output = self
            .runner
            .output(&args, Some(working_dir), SPAWN_TIMEOUT)
            .await?;
        let session_id = parse_session_id(&output);
        debug!(session_id = ?session_id, "Parsed local session id");
        Ok(SpawnOutcome { session_id, output })
    }

    async fn poll_status(&self, session_id: &str) -> Result<String, BackendError> {
        // A failed listing is usually a hiccup in the CLI's own network call.
        self.runner
            .output(
                &["remote", "list", "--session", session_id],
                None,
                self.status_timeout,
            )
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))
    }

    async fn pull_and_apply(
        &self,
        session_id: &str,
        working_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        let output = self
            .runner
            .output(
                &["remote", "pull", "--session", session_id, "--apply"],
                Some(working_dir),
                PULL_TIMEOUT,
            )
            .await?;
        Ok(parse_reported_paths(&output))
    }

    async fn cancel(&self, session_id: &str) -> Result<(), BackendError> {
        Err(BackendError::Unavailable(format!(
            "{} has no cancel command; stop session {} from the web console",
            self.runner.binary(),
            session_id
        )))
    }

    async fn list_sessions(&self) -> Result<String, BackendError> {
        Ok(self
            .runner
            .output(&["remote", "list", "--session"], None, self.status_timeout)
            .await?)
    }
}
