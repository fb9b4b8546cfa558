//! Declared backend capabilities.

use super::kind::BackendKind;
use serde::{Deserialize, Serialize};

/// Static capability declaration for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub kind: BackendKind,
    /// Supports long-running sessions detached from the caller.
    pub supports_async: bool,
    /// Can pause on a generated plan until it is approved.
    pub supports_plan_approval: bool,
    /// Largest task context (in source lines) the backend handles well.
    pub max_context_size: u64,
    /// Needs a long-lived credential (API key) rather than a local login.
    pub requires_credential: bool,
}

impl AgentDescriptor {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            supports_async: false,
            supports_plan_approval: false,
            max_context_size: 0,
            requires_credential: false,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_async(mut self, supported: bool) -> Self {
        self.supports_async = supported;
        self
    }

    pub fn with_plan_approval(mut self, supported: bool) -> Self {
        self.supports_plan_approval = supported;
        self
    }

    pub fn with_max_context_size(mut self, lines: u64) -> Self {
        self.max_context_size = lines;
        self
    }

    pub fn with_requires_credential(mut self, required: bool) -> Self {
        self.requires_credential = required;
        self
    }

    pub fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// Whether a task of `context_size` lines fits this backend.
    pub fn fits_context(&self, context_size: u64) -> bool {
        context_size <= self.max_context_size
    }
}
