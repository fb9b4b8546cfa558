//! Domain error types

use crate::session::state::SessionState;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown backend id: {0}")]
    UnknownBackend(String),

    #[error("Unknown execution mode: {0}")]
    UnknownMode(String),

    #[error("Unknown task complexity: {0}")]
    UnknownComplexity(String),

    #[error("Invalid session reference: {0}")]
    InvalidSessionRef(String),

    #[error("Illegal session transition: {from} -> {to}")]
    IllegalTransition { from: SessionState, to: SessionState },

    #[error("Invalid task request: {0}")]
    InvalidRequest(String),
}

impl DomainError {
    /// Check if this error comes from the session state machine
    pub fn is_transition_error(&self) -> bool {
        matches!(self, DomainError::IllegalTransition { .. })
    }
}
