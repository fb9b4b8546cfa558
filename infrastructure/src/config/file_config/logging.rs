//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL delegation log path
    pub delegation_log: Option<String>,
    /// Directory for daily-rotated diagnostic logs
    pub log_dir: Option<String>,
}
