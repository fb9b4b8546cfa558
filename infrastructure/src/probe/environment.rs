//! [`AvailabilityProbe`] backed by the real environment.
//!
//! The remote family needs a credential and the compiled-in HTTP client.
//! The local family needs the CLI on `PATH` and a successful session
//! listing, which is how the CLI reveals whether it is logged in.

use crate::config::FileRemoteConfig;
use crate::local::{CliError, CliRunner};
use crate::remote::CLIENT_COMPILED_IN;
use async_trait::async_trait;
use relay_application::AvailabilityProbe;
use relay_domain::{BackendAvailability, BackendFamily, ProbeDetails};
use std::time::Duration;
use tracing::debug;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

pub struct EnvironmentProbe {
    remote: FileRemoteConfig,
    client_compiled_in: bool,
    runner: CliRunner,
    login_timeout: Duration,
}

impl EnvironmentProbe {
    pub fn new(remote: FileRemoteConfig, binary: impl Into<String>, login_timeout: Duration) -> Self {
        Self {
            remote,
            client_compiled_in: CLIENT_COMPILED_IN,
            runner: CliRunner::new(binary),
            login_timeout,
        }
    }

    // ==================== Builder Methods ====================

    /// Override whether the HTTP client counts as installed.
    pub fn with_client_compiled_in(mut self, compiled_in: bool) -> Self {
        self.client_compiled_in = compiled_in;
        self
    }

    fn probe_remote(&self) -> BackendAvailability {
        let credential_present = self.remote.resolve_api_key().is_some();
        let details = ProbeDetails {
            credential_present: Some(credential_present),
            client_installed: Some(self.client_compiled_in),
            ..Default::default()
        };

        let mut missing = Vec::new();
        if !credential_present {
            missing.push(format!("no API key (set {})", self.remote.api_key_env));
        }
        if !self.client_compiled_in {
            missing.push("built without the remote-api feature".to_string());
        }

        if missing.is_empty() {
            BackendAvailability::available(details)
        } else {
            BackendAvailability::unavailable(missing.join(", "), details)
        }
    }

    async fn probe_local(&self) -> BackendAvailability {
        let binary = self.runner.binary();
        let path = match which::which(binary) {
            Ok(path) => path,
            Err(e) => {
                debug!(binary, error = %e, "Local CLI not found");
                return BackendAvailability::unavailable(
                    format!("{} not installed", binary),
                    ProbeDetails {
                        binary_installed: Some(false),
                        ..Default::default()
                    },
                );
            }
        };

        let version = self
            .runner
            .output(&["version"], None, VERSION_TIMEOUT)
            .await
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let login = self
            .runner
            .output(&["remote", "list"], None, self.login_timeout)
            .await;

        let details = ProbeDetails {
            binary_installed: Some(true),
            binary_path: Some(path.display().to_string()),
            logged_in: Some(login.is_ok()),
            version,
            ..Default::default()
        };

        match login {
            Ok(_) => BackendAvailability::available(details),
            Err(e) => {
                let captured = match e {
                    CliError::Exit { stderr, .. } if !stderr.is_empty() => stderr,
                    other => other.to_string(),
                };
                BackendAvailability::unavailable(
                    format!("login required (run: {} login): {}", binary, captured),
                    details,
                )
            }
        }
    }
}

#[async_trait]
impl AvailabilityProbe for EnvironmentProbe {
    async fn probe_family(&self, family: BackendFamily) -> BackendAvailability {
        match family {
            BackendFamily::Remote => self.probe_remote(),
            BackendFamily::Local => self.probe_local().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn remote_config(api_key: Option<&str>) -> FileRemoteConfig {
        FileRemoteConfig {
            api_key: api_key.map(str::to_string),
            api_key_env: "RELAY_TEST_UNSET_VARIABLE".to_string(),
            ..Default::default()
        }
    }

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-jules");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_remote_needs_key_and_client() {
        let probe = EnvironmentProbe::new(remote_config(Some("k")), "jules", Duration::from_secs(1))
            .with_client_compiled_in(true);
        assert!(probe.probe_family(BackendFamily::Remote).await.available);

        let probe = EnvironmentProbe::new(remote_config(None), "jules", Duration::from_secs(1))
            .with_client_compiled_in(false);
        let availability = probe.probe_family(BackendFamily::Remote).await;
        assert!(!availability.available);
        assert_eq!(availability.details.credential_present, Some(false));
        assert_eq!(availability.details.client_installed, Some(false));
        let reason = availability.reason_if_unavailable.unwrap();
        assert!(reason.contains("RELAY_TEST_UNSET_VARIABLE"));
        assert!(reason.contains("remote-api"));
    }

    #[tokio::test]
    async fn test_local_missing_binary() {
        let probe = EnvironmentProbe::new(
            remote_config(None),
            "agent-relay-definitely-missing-binary",
            Duration::from_secs(1),
        );
        let availability = probe.probe_family(BackendFamily::Local).await;
        assert!(!availability.available);
        assert_eq!(availability.details.binary_installed, Some(false));
    }

    #[tokio::test]
    async fn test_local_not_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let binary = script(
            dir.path(),
            r#"if [ "$1" = "version" ]; then echo "jules 0.9.1"; exit 0; fi
echo "not authenticated" >&2; exit 1"#,
        );
        let probe = EnvironmentProbe::new(
            remote_config(None),
            binary.to_string_lossy(),
            Duration::from_secs(5),
        );
        let availability = probe.probe_family(BackendFamily::Local).await;
        assert!(!availability.available);
        assert_eq!(availability.details.logged_in, Some(false));
        assert_eq!(availability.details.version.as_deref(), Some("jules 0.9.1"));
        let reason = availability.reason_if_unavailable.unwrap();
        assert!(reason.starts_with("login required (run: "));
        assert!(reason.ends_with("login): not authenticated"));
    }

    #[tokio::test]
    async fn test_local_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let binary = script(dir.path(), r#"echo "ok""#);
        let probe = EnvironmentProbe::new(
            remote_config(None),
            binary.to_string_lossy(),
            Duration::from_secs(5),
        );
        let availability = probe.probe_family(BackendFamily::Local).await;
        assert!(availability.available);
        assert_eq!(availability.details.logged_in, Some(true));
    }
}
