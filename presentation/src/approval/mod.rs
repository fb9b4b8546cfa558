//! Plan approval surfaces.

pub mod interactive;
