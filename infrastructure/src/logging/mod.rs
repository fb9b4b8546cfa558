//! Logging infrastructure: structured delegation logging.
//!
//! Provides [`JsonlDelegationLogger`], an append-only JSONL writer that
//! implements the [`DelegationLogger`](relay_application::DelegationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlDelegationLogger;
