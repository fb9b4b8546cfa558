//! Remote API configuration from TOML (`[remote]` section)

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://jules.googleapis.com/v1alpha";

/// Raw remote API configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRemoteConfig {
    /// Inline credential. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the credential
    pub api_key_env: String,
    /// API root, without a trailing slash
    pub base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout_seconds: u64,
}

impl Default for FileRemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "JULES_API_KEY".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl FileRemoteConfig {
    /// Credential from the inline key or the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }
}
