//! Delegated session domain.
//!
//! - [`state::SessionState`]: lifecycle state machine
//! - [`entities::Session`] / [`entities::SessionRef`]: one unit of delegated work
//! - [`activity`]: backend activity stream and log rendering
//! - [`result::ExecutionResult`]: what a finished (or abandoned) wait produces
//! - [`status_text`]: backend status vocabulary

pub mod activity;
pub mod entities;
pub mod result;
pub mod state;
pub mod status_text;
