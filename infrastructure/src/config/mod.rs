//! Configuration file loading for agent-relay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `RELAY_`-prefixed environment variables (`RELAY_POLLING__TIMEOUT_SECONDS=600`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./relay.toml` or `./.relay.toml`
//! 4. Global: `$XDG_CONFIG_HOME/agent-relay/config.toml` (usually `~/.config/agent-relay/config.toml`)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileLocalConfig, FileLoggingConfig, FilePollingConfig,
    FileRemoteConfig, FileRoutingConfig,
};
pub use loader::ConfigLoader;
