//! Infrastructure layer for agent-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod local;
pub mod logging;
pub mod probe;
pub mod remote;
pub mod workspace;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLocalConfig, FileLoggingConfig,
    FilePollingConfig, FileRemoteConfig, FileRoutingConfig,
};
pub use local::{CliError, CommandLocalBackend};
pub use logging::JsonlDelegationLogger;
pub use probe::EnvironmentProbe;
#[cfg(feature = "remote-api")]
pub use remote::HttpRemoteBackend;
pub use remote::{CLIENT_COMPILED_IN, DisabledRemoteBackend, RemoteApiError, connect as connect_remote};
pub use workspace::GitWorkspace;
