//! Task request entities.

use crate::backend::kind::BackendKind;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// How the caller wants a backend chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Let the selection policy decide.
    #[default]
    Auto,
    ForcedApi,
    ForcedCliHeadless,
    ForcedCliInteractive,
}

impl ExecutionMode {
    /// The backend named by a forced mode, `None` for [`ExecutionMode::Auto`].
    pub fn forced_backend(&self) -> Option<BackendKind> {
        match self {
            ExecutionMode::Auto => None,
            ExecutionMode::ForcedApi => Some(BackendKind::RemoteApi),
            ExecutionMode::ForcedCliHeadless => Some(BackendKind::LocalHeadless),
            ExecutionMode::ForcedCliInteractive => Some(BackendKind::LocalInteractive),
        }
    }

    pub fn is_forced(&self) -> bool {
        self.forced_backend().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Auto => "auto",
            ExecutionMode::ForcedApi => "api",
            ExecutionMode::ForcedCliHeadless => "cli_headless",
            ExecutionMode::ForcedCliInteractive => "cli_interactive",
        }
    }
}

impl From<BackendKind> for ExecutionMode {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::RemoteApi => ExecutionMode::ForcedApi,
            BackendKind::LocalHeadless => ExecutionMode::ForcedCliHeadless,
            BackendKind::LocalInteractive => ExecutionMode::ForcedCliInteractive,
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        if normalized == "auto" {
            return Ok(ExecutionMode::Auto);
        }
        let normalized = normalized.trim_start_matches("forced_");
        normalized
            .parse::<BackendKind>()
            .map(ExecutionMode::from)
            .map_err(|_| DomainError::UnknownMode(s.to_string()))
    }
}

/// Estimated size of a task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskComplexity {
    /// Minutes: typo fixes, doc touch-ups.
    Trivial,
    /// Single-file change.
    Simple,
    /// Several files plus tests.
    #[default]
    Moderate,
    /// New feature or refactor.
    Complex,
    /// Architecture-level work spanning days.
    Epic,
}

impl TaskComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskComplexity::Trivial => "trivial",
            TaskComplexity::Simple => "simple",
            TaskComplexity::Moderate => "moderate",
            TaskComplexity::Complex => "complex",
            TaskComplexity::Epic => "epic",
        }
    }

    /// Complex and epic tasks prefer an asynchronous backend.
    pub fn prefers_async(&self) -> bool {
        matches!(self, TaskComplexity::Complex | TaskComplexity::Epic)
    }
}

impl std::fmt::Display for TaskComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskComplexity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trivial" => Ok(TaskComplexity::Trivial),
            "simple" => Ok(TaskComplexity::Simple),
            "moderate" => Ok(TaskComplexity::Moderate),
            "complex" => Ok(TaskComplexity::Complex),
            "epic" => Ok(TaskComplexity::Epic),
            _ => Err(DomainError::UnknownComplexity(s.to_string())),
        }
    }
}

/// Default context estimate (in source lines) when the caller gives none.
pub const DEFAULT_CONTEXT_SIZE: u64 = 1_000;

/// Default starting branch for remote sessions.
pub const DEFAULT_BRANCH: &str = "main";

/// A coding task to delegate to exactly one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub prompt: String,
    pub working_dir: PathBuf,
    pub mode: ExecutionMode,
    pub needs_plan_approval: bool,
    pub estimated_context_size: u64,
    pub complexity: TaskComplexity,
    /// Starting branch for remote sessions.
    pub branch: String,
    /// Return as soon as the session exists instead of waiting for it.
    pub detached: bool,
}

impl TaskRequest {
    pub fn new(prompt: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            working_dir: working_dir.into(),
            mode: ExecutionMode::Auto,
            needs_plan_approval: false,
            estimated_context_size: DEFAULT_CONTEXT_SIZE,
            complexity: TaskComplexity::default(),
            branch: DEFAULT_BRANCH.to_string(),
            detached: false,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_plan_approval(mut self, required: bool) -> Self {
        self.needs_plan_approval = required;
        self
    }

    pub fn with_context_size(mut self, lines: u64) -> Self {
        self.estimated_context_size = lines;
        self
    }

    pub fn with_complexity(mut self, complexity: TaskComplexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Reject requests no backend could act on.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.prompt.trim().is_empty() {
            return Err(DomainError::InvalidRequest("prompt cannot be empty".into()));
        }
        if self.branch.trim().is_empty() {
            return Err(DomainError::InvalidRequest("branch cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("auto".parse::<ExecutionMode>().unwrap(), ExecutionMode::Auto);
        assert_eq!("api".parse::<ExecutionMode>().unwrap(), ExecutionMode::ForcedApi);
        assert_eq!(
            "forced_cli_headless".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::ForcedCliHeadless
        );
        assert_eq!(
            "cli-interactive".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::ForcedCliInteractive
        );
        assert!(matches!(
            "setup".parse::<ExecutionMode>(),
            Err(DomainError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_forced_backend() {
        assert_eq!(ExecutionMode::Auto.forced_backend(), None);
        assert_eq!(
            ExecutionMode::ForcedCliHeadless.forced_backend(),
            Some(BackendKind::LocalHeadless)
        );
        assert!(ExecutionMode::ForcedApi.is_forced());
    }

    #[test]
    fn test_complexity_ordering_and_async_preference() {
        assert!(TaskComplexity::Trivial < TaskComplexity::Epic);
        assert!(TaskComplexity::Complex.prefers_async());
        assert!(!TaskComplexity::Moderate.prefers_async());
        assert_eq!("EPIC".parse::<TaskComplexity>().unwrap(), TaskComplexity::Epic);
    }

    #[test]
    fn test_request_defaults_and_validation() {
        let request = TaskRequest::new("Fix the login bug", "/tmp/project");
        assert_eq!(request.mode, ExecutionMode::Auto);
        assert_eq!(request.branch, "main");
        assert_eq!(request.estimated_context_size, DEFAULT_CONTEXT_SIZE);
        assert!(request.validate().is_ok());

        let empty = TaskRequest::new("   ", "/tmp/project");
        assert!(matches!(empty.validate(), Err(DomainError::InvalidRequest(_))));
    }
}
