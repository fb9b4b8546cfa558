//! Local CLI configuration from TOML (`[local]` section)

use serde::{Deserialize, Serialize};

/// Raw local CLI configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLocalConfig {
    /// Binary name or path
    pub binary: String,
    /// Upper bound for the login probe and other short CLI calls
    pub probe_timeout_seconds: u64,
}

impl Default for FileLocalConfig {
    fn default() -> Self {
        Self {
            binary: "jules".to_string(),
            probe_timeout_seconds: 10,
        }
    }
}
