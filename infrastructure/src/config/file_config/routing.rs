//! Routing configuration from TOML (`[routing]` section)

use super::ConfigValidationError;
use relay_domain::{BackendKind, DEFAULT_PRIORITY};
use serde::{Deserialize, Serialize};

/// Raw routing configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoutingConfig {
    /// Auto-mode ordering, as backend ids
    pub priority: Vec<String>,
    /// Approve generated plans without asking
    pub auto_approve: bool,
}

impl Default for FileRoutingConfig {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY.iter().map(|k| k.as_str().to_string()).collect(),
            auto_approve: false,
        }
    }
}

impl FileRoutingConfig {
    pub fn parse_priority(&self) -> Result<Vec<BackendKind>, ConfigValidationError> {
        self.priority
            .iter()
            .map(|id| {
                let kind: BackendKind = id
                    .parse()
                    .map_err(|_| ConfigValidationError::UnknownBackend(id.clone()))?;
                if kind.is_interactive() {
                    return Err(ConfigValidationError::InteractiveInPriority(id.clone()));
                }
                Ok(kind)
            })
            .collect()
    }
}
