//! Backend routing.

pub mod policy;
