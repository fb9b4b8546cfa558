//! Environment probing for backend availability.

mod environment;

pub use environment::EnvironmentProbe;
