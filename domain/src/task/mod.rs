//! Task requests and their routing attributes.

pub mod complexity;
pub mod request;
