//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Conversion into application types happens here so the binary only wires
//! already-validated values.

mod local;
mod logging;
mod polling;
mod remote;
mod routing;

pub use local::FileLocalConfig;
pub use logging::FileLoggingConfig;
pub use polling::FilePollingConfig;
pub use remote::FileRemoteConfig;
pub use routing::FileRoutingConfig;

use relay_application::DelegationParams;
use relay_domain::{BackendKind, SetupHints};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("polling.interval_seconds cannot be 0")]
    InvalidPollInterval,

    #[error("polling.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("local.binary cannot be empty")]
    EmptyBinaryName,

    #[error("remote.api_key_env cannot be empty")]
    EmptyCredentialEnv,

    #[error("routing.priority: unknown backend '{0}'")]
    UnknownBackend(String),

    #[error("routing.priority: {0} hands control to a human and cannot be auto-selected")]
    InteractiveInPriority(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Remote session API
    pub remote: FileRemoteConfig,
    /// Local CLI
    pub local: FileLocalConfig,
    /// Backend selection
    pub routing: FileRoutingConfig,
    /// Status polling and time budgets
    pub polling: FilePollingConfig,
    /// Diagnostic and delegation logs
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.polling.interval_seconds == 0 {
            return Err(ConfigValidationError::InvalidPollInterval);
        }
        if self.polling.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.local.binary.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBinaryName);
        }
        if self.remote.api_key_env.trim().is_empty() {
            return Err(ConfigValidationError::EmptyCredentialEnv);
        }
        self.routing.parse_priority()?;
        Ok(())
    }

    /// Session driving parameters for the application layer.
    pub fn delegation_params(&self) -> DelegationParams {
        self.polling
            .to_params()
            .with_auto_approve(self.routing.auto_approve)
    }

    /// Auto-mode ordering.
    pub fn priority(&self) -> Result<Vec<BackendKind>, ConfigValidationError> {
        self.routing.parse_priority()
    }

    /// Names used when generating setup instructions.
    pub fn setup_hints(&self) -> SetupHints {
        SetupHints {
            binary: self.local.binary.clone(),
            credential_env: self.remote.api_key_env.clone(),
        }
    }
}
