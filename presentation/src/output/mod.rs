//! Output formatting for delegation results.

pub mod console;
pub mod formatter;
pub mod json;
