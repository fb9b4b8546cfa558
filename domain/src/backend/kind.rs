//! Backend identities.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An external coding-agent execution surface.
///
/// Each kind belongs to a [`BackendFamily`]. The two local kinds drive the
/// same command-line tool and therefore share one availability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Remote asynchronous session service.
    RemoteApi,
    /// Local command-line session running in the background.
    LocalHeadless,
    /// Local command-line session handed to the user's terminal.
    LocalInteractive,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::RemoteApi,
        BackendKind::LocalHeadless,
        BackendKind::LocalInteractive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::RemoteApi => "remote_api",
            BackendKind::LocalHeadless => "local_headless",
            BackendKind::LocalInteractive => "local_interactive",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::RemoteApi => "Remote API",
            BackendKind::LocalHeadless => "Local CLI (headless)",
            BackendKind::LocalInteractive => "Local CLI (interactive)",
        }
    }

    pub fn family(&self) -> BackendFamily {
        match self {
            BackendKind::RemoteApi => BackendFamily::Remote,
            BackendKind::LocalHeadless | BackendKind::LocalInteractive => BackendFamily::Local,
        }
    }

    /// Whether control passes to a human once the session starts.
    pub fn is_interactive(&self) -> bool {
        matches!(self, BackendKind::LocalInteractive)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "remote_api" | "remote" | "api" => Ok(BackendKind::RemoteApi),
            "local_headless" | "cli" | "cli_headless" | "headless" => {
                Ok(BackendKind::LocalHeadless)
            }
            "local_interactive" | "cli_interactive" | "interactive" => {
                Ok(BackendKind::LocalInteractive)
            }
            _ => Err(DomainError::UnknownBackend(s.to_string())),
        }
    }
}

/// A group of backends sharing prerequisites (and a setup path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendFamily {
    Remote,
    Local,
}

impl BackendFamily {
    pub const ALL: [BackendFamily; 2] = [BackendFamily::Remote, BackendFamily::Local];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendFamily::Remote => "remote",
            BackendFamily::Local => "local",
        }
    }

    pub fn kinds(&self) -> &'static [BackendKind] {
        match self {
            BackendFamily::Remote => &[BackendKind::RemoteApi],
            BackendFamily::Local => &[BackendKind::LocalHeadless, BackendKind::LocalInteractive],
        }
    }
}

impl std::fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
