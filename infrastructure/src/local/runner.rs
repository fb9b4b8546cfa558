//! Bounded subprocess execution for the local CLI.

use relay_application::BackendError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Errors from running the local CLI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("{0} not found on PATH")]
    NotFound(String),

    #[error("could not start {binary}: {message}")]
    Spawn { binary: String, message: String },

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("`{command}` exited with {}: {stderr}", code.map_or("a signal".to_string(), |c| format!("status {}", c)))]
    Exit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl From<CliError> for BackendError {
    fn from(error: CliError) -> Self {
        let message = error.to_string();
        match error {
            CliError::NotFound(_) | CliError::Spawn { .. } => BackendError::Unavailable(message),
            CliError::Timeout { .. } => BackendError::Transient(message),
            CliError::Exit { .. } => BackendError::Rejected(message),
        }
    }
}

/// Runs the CLI binary with captured output and a time bound.
///
/// The child is killed if the bound elapses or the caller stops waiting.
#[derive(Debug, Clone)]
pub struct CliRunner {
    binary: String,
}

impl CliRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self, args: &[&str], dir: Option<&Path>) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(args).kill_on_drop(true);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        command
    }

    fn spawn_error(&self, error: std::io::Error) -> CliError {
        if error.kind() == std::io::ErrorKind::NotFound {
            CliError::NotFound(self.binary.clone())
        } else {
            CliError::Spawn {
                binary: self.binary.clone(),
                message: error.to_string(),
            }
        }
    }

    /// Run to completion and return stdout.
    pub async fn output(
        &self,
        args: &[&str],
        dir: Option<&Path>,
        timeout: Duration,
    ) -> Result<String, CliError> {
        let mut command = self.command(args, dir);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let rendered = format!("{} {}", self.binary, args.join(" "));
        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| CliError::Timeout {
                command: rendered.clone(),
                seconds: timeout.as_secs(),
            })?
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(CliError::Exit {
                command: rendered,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run attached to the current terminal until the user exits.
    pub async fn attached(&self, args: &[&str], dir: Option<&Path>) -> Result<(), CliError> {
        let mut command = self.command(args, dir);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = command.status().await.map_err(|e| self.spawn_error(e))?;
        if status.success() {
            Ok(())
        } else {
            Err(CliError::Exit {
                command: format!("{} {}", self.binary, args.join(" ")),
                code: status.code(),
                stderr: "interactive session ended unsuccessfully".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = CliRunner::new("sh");
        let output = runner
            .output(&["-c", "echo Session created: abc123"], None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.trim(), "Session created: abc123");
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_stderr() {
        let runner = CliRunner::new("sh");
        let err = runner
            .output(&["-c", "echo not authenticated >&2; exit 3"], None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            CliError::Exit { code: Some(3), stderr, .. } if stderr == "not authenticated"
        ));
        assert!(matches!(BackendError::from(err), BackendError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let runner = CliRunner::new("sh");
        let err = runner
            .output(&["-c", "sleep 5"], None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Timeout { .. }));
        assert!(BackendError::from(err).is_transient());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = CliRunner::new("agent-relay-definitely-missing-binary");
        let err = runner
            .output(&["version"], None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }
}
