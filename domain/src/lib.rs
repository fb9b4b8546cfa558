//! Domain layer for agent-relay
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Backends
//!
//! A backend is an external coding-agent execution surface:
//!
//! - **Remote API**: asynchronous sessions with plan approval
//! - **Local CLI (headless)**: a command-line session driven by polling
//! - **Local CLI (interactive)**: hands the terminal to a human
//!
//! ## Routing
//!
//! The [`SelectionPolicy`] is a pure function of the request, the current
//! [`AvailabilityReport`] and the [`CapabilityRegistry`]. When nothing is
//! usable, [`generate_setup_guide`] explains how to fix that.
//!
//! ## Sessions
//!
//! Every delegation drives exactly one [`Session`] through the
//! [`SessionState`] machine and ends in an [`ExecutionResult`].

pub mod backend;
pub mod core;
pub mod routing;
pub mod session;
pub mod setup;
pub mod task;

// Re-export commonly used types
pub use backend::{
    availability::{AvailabilityReport, BackendAvailability, ProbeDetails},
    descriptor::AgentDescriptor,
    kind::{BackendFamily, BackendKind},
    registry::CapabilityRegistry,
};
pub use core::error::DomainError;
pub use routing::policy::{
    DEFAULT_PRIORITY, Selection, SelectionError, SelectionPolicy, SelectionReason,
};
pub use session::{
    activity::{Activity, ActivityKind, collect_modified_files, format_activity_log},
    entities::{Session, SessionRef, SessionSnapshot},
    result::{DelegationOutcome, ExecutionResult, ResultError, ResultErrorKind},
    state::SessionState,
    status_text::{map_status_word, parse_status_text},
};
pub use setup::guide::{
    REGISTRATION_URL, SetupGuide, SetupHints, SetupOption, SetupStep, generate_setup_guide,
};
pub use task::{
    complexity::{TaskEstimate, estimate_complexity, estimate_task},
    request::{DEFAULT_BRANCH, DEFAULT_CONTEXT_SIZE, ExecutionMode, TaskComplexity, TaskRequest},
};
