//! Session domain entities

use super::state::SessionState;
use crate::backend::kind::BackendKind;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

/// Stable reference to a backend session.
///
/// Renders as `backend:id` (e.g. `remote_api:1234567`) so callers can store it
/// and hand it back to `status`/`approve`/`cancel` later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRef {
    pub backend: BackendKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl SessionRef {
    pub fn new(backend: BackendKind, id: impl Into<String>) -> Self {
        Self {
            backend,
            id: id.into(),
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl std::fmt::Display for SessionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.backend, self.id)
    }
}

impl FromStr for SessionRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (backend, id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| DomainError::InvalidSessionRef(s.to_string()))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(DomainError::InvalidSessionRef(s.to_string()));
        }
        let backend = backend
            .parse::<BackendKind>()
            .map_err(|_| DomainError::InvalidSessionRef(s.to_string()))?;
        Ok(SessionRef::new(backend, id))
    }
}

/// One unit of delegated work (Entity).
///
/// Tracks the current state and every state it has passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    reference: SessionRef,
    state: SessionState,
    history: Vec<SessionState>,
}

impl Session {
    pub fn new(reference: SessionRef) -> Self {
        Self {
            reference,
            state: SessionState::Created,
            history: vec![SessionState::Created],
        }
    }

    pub fn reference(&self) -> &SessionRef {
        &self.reference
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// Move to `next`, rejecting backward or post-terminal moves.
    ///
    /// Re-entering the current state is a no-op so repeated backend reports
    /// of the same status do not error.
    pub fn transition(&mut self, next: SessionState) -> Result<(), DomainError> {
        if next == self.state {
            return Ok(());
        }
        self.state = self.state.transition(next)?;
        self.history.push(next);
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Point-in-time view of a session, as returned by a status query.
///
/// Carries no wall-clock fields, so two reads of an unchanged session compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: SessionRef,
    pub state: SessionState,
    pub modified_files: BTreeSet<PathBuf>,
    pub log_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SessionSnapshot {
    pub fn new(session: SessionRef, state: SessionState) -> Self {
        Self {
            session,
            state,
            modified_files: BTreeSet::new(),
            log_text: String::new(),
            message: None,
        }
    }

    pub fn with_modified_files(mut self, files: BTreeSet<PathBuf>) -> Self {
        self.modified_files = files;
        self
    }

    pub fn with_log_text(mut self, log_text: impl Into<String>) -> Self {
        self.log_text = log_text.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
