//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["relay.toml", ".relay.toml"];
const ENV_PREFIX: &str = "RELAY_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `RELAY_` environment variables, `__` separating section and key
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./relay.toml` or `./.relay.toml`
    /// 4. Global: `~/.config/agent-relay/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// The merged provider chain, before extraction.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/agent-relay/config.toml if set,
    /// otherwise falls back to ~/.config/agent-relay/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("agent-relay").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config sources in priority order (for --show-config)
    pub fn describe_sources(config_path: Option<&Path>) -> Vec<String> {
        let mark = |found: bool| if found { "[FOUND]" } else { "[     ]" };
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];

        lines.push(format!("  [ENV  ] Environment: {}*", ENV_PREFIX));
        if let Some(path) = config_path {
            lines.push(format!("  {} Explicit: {}", mark(path.exists()), path.display()));
        }
        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push(format!(
                "  [     ] Project: ./{} or ./{}",
                PROJECT_FILES[0], PROJECT_FILES[1]
            )),
        }
        if let Some(path) = Self::global_config_path() {
            lines.push(format!("  {} Global:  {}", mark(path.exists()), path.display()));
        }
        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}
