//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod availability_probe;
pub mod backend_error;
pub mod clock;
pub mod delegation_logger;
pub mod local_backend;
pub mod plan_approval;
pub mod progress;
pub mod remote_backend;
pub mod workspace;
