//! Backend identities, capabilities, and availability.
//!
//! - [`kind::BackendKind`] / [`kind::BackendFamily`]: who can execute a task
//! - [`descriptor::AgentDescriptor`]: what a backend declares it can do
//! - [`registry::CapabilityRegistry`]: read-only descriptor table
//! - [`availability::AvailabilityReport`]: what is usable right now

pub mod availability;
pub mod descriptor;
pub mod kind;
pub mod registry;
