//! Remote session backend port
//!
//! Defines the interface for the asynchronous remote session service.
//! The HTTP adapter lives in the infrastructure layer.

use super::backend_error::BackendError;
use async_trait::async_trait;
use relay_domain::Activity;
use serde::{Deserialize, Serialize};

/// A repository registered with the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    /// Resource name used when creating sessions (e.g. `sources/github/acme/api`).
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
}

impl RemoteSource {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            owner: None,
            repo: None,
        }
    }

    pub fn with_repository(mut self, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self.repo = Some(repo.into());
        self
    }

    /// `owner/repo`, when the source is backed by a repository.
    pub fn full_name(&self) -> Option<String> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Some(format!("{}/{}", owner, repo)),
            _ => None,
        }
    }
}

/// Parameters for creating a remote session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRemoteSession {
    pub prompt: String,
    /// Source resource name from [`RemoteSource::name`].
    pub source: String,
    pub branch: String,
    pub require_plan_approval: bool,
}

/// Remote view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSessionInfo {
    pub id: String,
    /// Backend status word (e.g. `IN_PROGRESS`), mapped by the caller.
    pub state: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Remote asynchronous session service.
#[async_trait]
pub trait RemoteSessionBackend: Send + Sync {
    async fn list_sources(&self) -> Result<Vec<RemoteSource>, BackendError>;

    async fn create_session(
        &self,
        request: &NewRemoteSession,
    ) -> Result<RemoteSessionInfo, BackendError>;

    async fn get_session(&self, id: &str) -> Result<RemoteSessionInfo, BackendError>;

    /// Recorded activities, in the order the backend reports them.
    async fn list_activities(&self, id: &str) -> Result<Vec<Activity>, BackendError>;

    async fn approve_plan(&self, id: &str) -> Result<(), BackendError>;

    async fn cancel(&self, id: &str) -> Result<(), BackendError>;
}
