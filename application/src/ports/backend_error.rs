//! Errors shared by backend ports.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a remote or local backend adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Network hiccup, rate limit or server error; worth retrying.
    #[error("Transient backend error: {0}")]
    Transient(String),

    /// The backend understood the request and refused it.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend cannot be used at all (missing binary, client not compiled in).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }

    /// The backend's own message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            BackendError::Transient(msg)
            | BackendError::Rejected(msg)
            | BackendError::NotFound(msg)
            | BackendError::Unavailable(msg) => msg,
        }
    }
}

/// Failure inspecting or caching state in a working directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("git command failed: {0}")]
    Git(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for WorkspaceError {
    fn from(error: std::io::Error) -> Self {
        WorkspaceError::Io(error.to_string())
    }
}
