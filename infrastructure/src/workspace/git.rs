//! [`WorkspacePort`] implemented with the `git` binary.
//!
//! Snapshots fingerprint every path `git status` reports as dirty, so two
//! snapshots differ exactly where the tree changed in between. Paths are
//! relative to the directory the snapshot was taken in.

use crate::local::{CliError, CliRunner};
use async_trait::async_trait;
use relay_application::{WorkspaceError, WorkspacePort, WorkspaceSnapshot};
use std::collections::BTreeSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Cached remote source name, relative to the working directory.
pub const SOURCE_CACHE_FILE: &str = ".jules/source_id";

const GIT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct GitWorkspace {
    git: CliRunner,
}

impl GitWorkspace {
    pub fn new() -> Self {
        Self {
            git: CliRunner::new("git"),
        }
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<String, CliError> {
        self.git.output(args, Some(dir), GIT_TIMEOUT).await
    }

    async fn fingerprint(path: &Path, status: &str) -> String {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let mut hasher = DefaultHasher::new();
                bytes.hash(&mut hasher);
                format!("{}:{:016x}", status, hasher.finish())
            }
            Err(_) => format!("{}:absent", status),
        }
    }
}

impl Default for GitWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

fn git_error(error: CliError) -> WorkspaceError {
    WorkspaceError::Git(error.to_string())
}

/// `(status, path)` pairs from `git status --porcelain -z`.
fn parse_porcelain(output: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut fields = output.split('\0').filter(|f| !f.is_empty());
    while let Some(field) = fields.next() {
        if field.len() < 4 {
            continue;
        }
        let (status, path) = field.split_at(3);
        let status = status.trim().to_string();
        // Renames and copies are followed by their origin path.
        if status.starts_with('R') || status.starts_with('C') {
            fields.next();
        }
        entries.push((status, path.to_string()));
    }
    entries
}

#[async_trait]
impl WorkspacePort for GitWorkspace {
    async fn is_repository(&self, dir: &Path) -> bool {
        matches!(
            self.git(dir, &["rev-parse", "--is-inside-work-tree"]).await,
            Ok(out) if out.trim() == "true"
        )
    }

    async fn git_remote_url(&self, dir: &Path) -> Result<Option<String>, WorkspaceError> {
        match self.git(dir, &["remote", "get-url", "origin"]).await {
            Ok(url) => Ok(Some(url.trim().to_string()).filter(|u| !u.is_empty())),
            Err(CliError::Exit { .. }) => Ok(None),
            Err(e) => Err(git_error(e)),
        }
    }

    async fn read_source_cache(&self, dir: &Path) -> Result<Option<String>, WorkspaceError> {
        match tokio::fs::read_to_string(dir.join(SOURCE_CACHE_FILE)).await {
            Ok(content) => Ok(Some(content.trim().to_string()).filter(|s| !s.is_empty())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_source_cache(&self, dir: &Path, source: &str) -> Result<(), WorkspaceError> {
        let path = dir.join(SOURCE_CACHE_FILE);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, format!("{}\n", source)).await?;
        debug!(path = %path.display(), source, "Cached remote source");
        Ok(())
    }

    async fn snapshot(&self, dir: &Path) -> Result<WorkspaceSnapshot, WorkspaceError> {
        if !self.is_repository(dir).await {
            return Err(WorkspaceError::NotARepository(dir.to_path_buf()));
        }

        let head = self
            .git(dir, &["rev-parse", "HEAD"])
            .await
            .ok()
            .map(|h| h.trim().to_string());
        let prefix = self
            .git(dir, &["rev-parse", "--show-prefix"])
            .await
            .map_err(git_error)?
            .trim()
            .to_string();
        let status = self
            .git(dir, &["status", "--porcelain", "-z", "--untracked-files=all"])
            .await
            .map_err(git_error)?;

        let mut snapshot = WorkspaceSnapshot::new(head);
        for (code, path) in parse_porcelain(&status) {
            let Some(relative) = path.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let fingerprint = Self::fingerprint(&dir.join(relative), &code).await;
            snapshot = snapshot.with_entry(relative, fingerprint);
        }
        Ok(snapshot)
    }

    async fn changed_between(
        &self,
        dir: &Path,
        before: &WorkspaceSnapshot,
        after: &WorkspaceSnapshot,
    ) -> Result<BTreeSet<PathBuf>, WorkspaceError> {
        let mut changed = before.diff(after);

        // Results that arrive as commits leave the tree clean; ask git for those.
        if let (Some(old), Some(new)) = (&before.head, &after.head)
            && old != new
        {
            let committed = self
                .git(dir, &["diff", "--name-only", "--relative", old, new])
                .await
                .map_err(git_error)?;
            changed.extend(committed.lines().filter(|l| !l.is_empty()).map(PathBuf::from));
        }
        Ok(changed)
    }
}
