//! Application layer for agent-relay
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DelegationParams, RetryPolicy};
pub use ports::{
    availability_probe::AvailabilityProbe,
    backend_error::{BackendError, WorkspaceError},
    clock::{Clock, TokioClock},
    delegation_logger::{DelegationEvent, DelegationLogger, NoDelegationLogger},
    local_backend::{LocalCliBackend, SpawnOutcome},
    plan_approval::{
        ApprovalDecision, AutoApprovePlan, DeferPlanApproval, PlanApprovalError, PlanApprovalPort,
        PlanReview,
    },
    progress::{DelegationProgress, NoProgress},
    remote_backend::{NewRemoteSession, RemoteSessionBackend, RemoteSessionInfo, RemoteSource},
    workspace::{WorkspacePort, WorkspaceSnapshot},
};
pub use use_cases::delegate_task::{DelegateTaskUseCase, DelegationError};
pub use use_cases::detect_availability::{AvailabilityCache, ModeDetector};
pub use use_cases::session::{
    SessionContext, SessionManager, local_headless::LocalHeadlessSessionManager,
    local_interactive::LocalInteractiveSessionManager, remote::RemoteSessionManager,
};
