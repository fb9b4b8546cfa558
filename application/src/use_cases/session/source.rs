//! Remote source resolution.
//!
//! Maps a working directory to a source registered with the remote service:
//!
//! 1. the source cached in the working directory by an earlier run
//! 2. the `origin` remote URL matched against each source's `owner/repo`
//! 3. the directory name matched against each source's repository name
//!
//! A match from 2 or 3 is written back to the cache.

use crate::ports::remote_backend::{RemoteSessionBackend, RemoteSource};
use crate::ports::workspace::WorkspacePort;
use crate::use_cases::delegate_task::DelegationError;
use relay_domain::{BackendKind, REGISTRATION_URL};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SourceResolver {
    remote: Arc<dyn RemoteSessionBackend>,
    workspace: Arc<dyn WorkspacePort>,
}

impl SourceResolver {
    pub fn new(remote: Arc<dyn RemoteSessionBackend>, workspace: Arc<dyn WorkspacePort>) -> Self {
        Self { remote, workspace }
    }

    /// Resolve `dir` to a source resource name.
    pub async fn resolve(&self, dir: &Path) -> Result<String, DelegationError> {
        match self.workspace.read_source_cache(dir).await {
            Ok(Some(cached)) => {
                debug!(source = %cached, "Using cached remote source");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read source cache"),
        }

        let sources = self
            .remote
            .list_sources()
            .await
            .map_err(|e| DelegationError::Resolution {
                backend: BackendKind::RemoteApi,
                cause: format!("could not list registered sources: {}", e),
                remediation: None,
            })?;

        let remote_url = match self.workspace.git_remote_url(dir).await {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "No git remote available for source matching");
                None
            }
        };

        let matched = remote_url
            .as_deref()
            .and_then(|url| match_by_remote_url(&sources, url))
            .or_else(|| match_by_directory_name(&sources, dir));

        let Some(source) = matched else {
            return Err(DelegationError::Resolution {
                backend: BackendKind::RemoteApi,
                cause: format!(
                    "no registered source matches {} ({} source(s) registered)",
                    dir.display(),
                    sources.len()
                ),
                remediation: Some(format!("connect the repository at {}", REGISTRATION_URL)),
            });
        };

        info!(source = %source.name, "Resolved remote source");
        if let Err(e) = self.workspace.write_source_cache(dir, &source.name).await {
            warn!(error = %e, "Could not cache resolved source");
        }
        Ok(source.name.clone())
    }
}

/// Strip scheme noise so `git@host:owner/repo.git` and
/// `https://host/owner/repo/` compare alike.
fn normalize_remote_url(url: &str) -> String {
    url.trim()
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .replace(':', "/")
        .to_lowercase()
}

fn match_by_remote_url<'a>(sources: &'a [RemoteSource], url: &str) -> Option<&'a RemoteSource> {
    let normalized = normalize_remote_url(url);
    sources.iter().find(|source| {
        source.full_name().is_some_and(|full_name| {
            let suffix = format!("/{}", full_name.to_lowercase());
            normalized.ends_with(&suffix)
        })
    })
}

fn match_by_directory_name<'a>(
    sources: &'a [RemoteSource],
    dir: &Path,
) -> Option<&'a RemoteSource> {
    let name = dir.file_name()?.to_str()?.to_lowercase();
    sources.iter().find(|source| {
        source
            .repo
            .as_deref()
            .is_some_and(|repo| repo.to_lowercase() == name)
    })
}
