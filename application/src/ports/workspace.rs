//! Workspace port: version-control facts about a working directory.

use super::backend_error::WorkspaceError;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Working-tree state at one point in time.
///
/// Maps every dirty or untracked path (relative to the repository root) to a
/// content fingerprint; clean files are absent. `head` is the checked-out
/// commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub head: Option<String>,
    pub entries: BTreeMap<PathBuf, String>,
}

impl WorkspaceSnapshot {
    pub fn new(head: Option<String>) -> Self {
        Self {
            head,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, path: impl Into<PathBuf>, fingerprint: impl Into<String>) -> Self {
        self.entries.insert(path.into(), fingerprint.into());
        self
    }

    /// Paths whose fingerprint differs between `self` and `after`, including
    /// paths present in only one of them.
    pub fn diff(&self, after: &WorkspaceSnapshot) -> BTreeSet<PathBuf> {
        let mut changed = BTreeSet::new();
        for (path, fingerprint) in &self.entries {
            if after.entries.get(path) != Some(fingerprint) {
                changed.insert(path.clone());
            }
        }
        for path in after.entries.keys() {
            if !self.entries.contains_key(path) {
                changed.insert(path.clone());
            }
        }
        changed
    }
}

/// Access to the working directory's repository.
#[async_trait]
pub trait WorkspacePort: Send + Sync {
    async fn is_repository(&self, dir: &Path) -> bool;

    /// URL of the `origin` remote, if any.
    async fn git_remote_url(&self, dir: &Path) -> Result<Option<String>, WorkspaceError>;

    /// Previously resolved remote source name.
    async fn read_source_cache(&self, dir: &Path) -> Result<Option<String>, WorkspaceError>;

    async fn write_source_cache(&self, dir: &Path, source: &str) -> Result<(), WorkspaceError>;

    async fn snapshot(&self, dir: &Path) -> Result<WorkspaceSnapshot, WorkspaceError>;

    /// Paths that differ between two snapshots of `dir`.
    ///
    /// The default compares fingerprints only; adapters that can see commit
    /// history also report files changed between the two heads.
    async fn changed_between(
        &self,
        _dir: &Path,
        before: &WorkspaceSnapshot,
        after: &WorkspaceSnapshot,
    ) -> Result<BTreeSet<PathBuf>, WorkspaceError> {
        Ok(before.diff(after))
    }
}
