//! Local CLI adapter.
//!
//! Drives the `jules` binary as a subprocess. Output is free text, so the
//! session id and reported files are recovered with pattern matching.

mod backend;
mod parse;
mod runner;

pub use backend::CommandLocalBackend;
pub use parse::{parse_reported_paths, parse_session_id};
pub use runner::{CliError, CliRunner};
