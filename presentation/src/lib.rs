//! Presentation layer for agent-relay
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, and the interactive plan approval prompt.

pub mod approval;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use approval::interactive::InteractivePlanApproval;
pub use cli::commands::{Cli, Command, DelegateArgs, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::json::JsonFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
