//! Setup guidance.

pub mod guide;
