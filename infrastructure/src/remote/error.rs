//! Remote API error types.

use relay_application::BackendError;
use thiserror::Error;

/// Errors from the remote session API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteApiError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl RemoteApiError {
    /// Rate limits, server errors and transport failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteApiError::Http { status, .. } => *status == 429 || *status >= 500,
            RemoteApiError::Transport(_) => true,
            RemoteApiError::Decode(_) | RemoteApiError::Client(_) => false,
        }
    }
}

impl From<RemoteApiError> for BackendError {
    fn from(error: RemoteApiError) -> Self {
        let message = error.to_string();
        match error {
            e if e.is_transient() => BackendError::Transient(message),
            RemoteApiError::Http { status: 404, .. } => BackendError::NotFound(message),
            RemoteApiError::Http { status: 401 | 403, .. } => BackendError::Unavailable(format!(
                "credential rejected ({}); check your API key",
                message
            )),
            RemoteApiError::Client(_) => BackendError::Unavailable(message),
            _ => BackendError::Rejected(message),
        }
    }
}
