//! Progress reporting during delegation.

pub mod reporter;
