//! Remote session API adapter.
//!
//! The HTTP client is compiled in with the `remote-api` feature. Without it,
//! [`DisabledRemoteBackend`] stands in so status queries still fail with a
//! clear message, and the probe reports the client as missing.

#[cfg(feature = "remote-api")]
mod client;
mod error;
mod protocol;

#[cfg(feature = "remote-api")]
pub use client::HttpRemoteBackend;
pub use error::RemoteApiError;

use crate::config::FileRemoteConfig;
use async_trait::async_trait;
use relay_application::{
    BackendError, NewRemoteSession, RemoteSessionBackend, RemoteSessionInfo, RemoteSource,
};
use relay_domain::Activity;
use std::sync::Arc;

/// Whether this build can talk to the remote API at all.
pub const CLIENT_COMPILED_IN: bool = cfg!(feature = "remote-api");

/// Build the remote backend described by `config`.
///
/// Falls back to [`DisabledRemoteBackend`] when the client is not compiled in,
/// no credential is configured, or the client cannot be constructed.
pub fn connect(config: &FileRemoteConfig) -> Arc<dyn RemoteSessionBackend> {
    let Some(api_key) = config.resolve_api_key() else {
        return Arc::new(DisabledRemoteBackend::new(format!(
            "no API key (set {})",
            config.api_key_env
        )));
    };
    connect_with_key(config, api_key)
}

#[cfg(feature = "remote-api")]
fn connect_with_key(config: &FileRemoteConfig, api_key: String) -> Arc<dyn RemoteSessionBackend> {
    let timeout = std::time::Duration::from_secs(config.request_timeout_seconds);
    match HttpRemoteBackend::new(&config.base_url, api_key, timeout) {
        Ok(backend) => Arc::new(backend),
        Err(e) => Arc::new(DisabledRemoteBackend::new(e.to_string())),
    }
}

#[cfg(not(feature = "remote-api"))]
fn connect_with_key(_config: &FileRemoteConfig, _api_key: String) -> Arc<dyn RemoteSessionBackend> {
    Arc::new(DisabledRemoteBackend::new(
        "built without the remote-api feature",
    ))
}

/// Remote backend used when no client or credential is configured.
pub struct DisabledRemoteBackend {
    reason: String,
}

impl DisabledRemoteBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> BackendError {
        BackendError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl RemoteSessionBackend for DisabledRemoteBackend {
    async fn list_sources(&self) -> Result<Vec<RemoteSource>, BackendError> {
        Err(self.error())
    }

    async fn create_session(
        &self,
        _request: &NewRemoteSession,
    ) -> Result<RemoteSessionInfo, BackendError> {
        Err(self.error())
    }

    async fn get_session(&self, _id: &str) -> Result<RemoteSessionInfo, BackendError> {
        Err(self.error())
    }

    async fn list_activities(&self, _id: &str) -> Result<Vec<Activity>, BackendError> {
        Err(self.error())
    }

    async fn approve_plan(&self, _id: &str) -> Result<(), BackendError> {
        Err(self.error())
    }

    async fn cancel(&self, _id: &str) -> Result<(), BackendError> {
        Err(self.error())
    }
}
