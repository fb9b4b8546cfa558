//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod delegate_task;
pub mod detect_availability;
pub(crate) mod polling;
pub mod session;
pub(crate) mod shared;
