//! Session lifecycle state machine.
//!
//! # State Transitions
//!
//! ```text
//! Created ──> AwaitingApproval ──> Running ──> Completed
//!    │               │                    ├──> Failed
//!    │               │                    ├──> TimedOut
//!    │               │                    └──> Cancelled
//!    │               └──> (any terminal state)
//!    ├──> Running
//!    ├──> HandedOff
//!    └──> (any terminal state)
//! ```
//!
//! Transitions only move forward. `HandedOff` is terminal: once control passes
//! to a human nothing further is observable.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// State of a delegated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Created,
    AwaitingApproval,
    Running,
    HandedOff,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "CREATED",
            SessionState::AwaitingApproval => "AWAITING_APPROVAL",
            SessionState::Running => "RUNNING",
            SessionState::HandedOff => "HANDED_OFF",
            SessionState::Completed => "COMPLETED",
            SessionState::Failed => "FAILED",
            SessionState::TimedOut => "TIMED_OUT",
            SessionState::Cancelled => "CANCELLED",
        }
    }

    /// States that end a wait loop.
    ///
    /// `TimedOut` is terminal for the caller only; the backend session may
    /// still be running and can be re-queried later.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::HandedOff
                | SessionState::Completed
                | SessionState::Failed
                | SessionState::TimedOut
                | SessionState::Cancelled
        )
    }

    /// Whether the session ended in a successful state.
    pub fn is_success(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::HandedOff)
    }

    fn rank(&self) -> u8 {
        match self {
            SessionState::Created => 0,
            SessionState::AwaitingApproval => 1,
            SessionState::Running => 2,
            _ => 3,
        }
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            SessionState::Created => false,
            SessionState::HandedOff => *self == SessionState::Created,
            _ => next.rank() > self.rank(),
        }
    }

    /// Validate a transition, returning the new state.
    pub fn transition(self, next: SessionState) -> Result<SessionState, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "CREATED" => Ok(SessionState::Created),
            "AWAITING_APPROVAL" => Ok(SessionState::AwaitingApproval),
            "RUNNING" => Ok(SessionState::Running),
            "HANDED_OFF" => Ok(SessionState::HandedOff),
            "COMPLETED" => Ok(SessionState::Completed),
            "FAILED" => Ok(SessionState::Failed),
            "TIMED_OUT" => Ok(SessionState::TimedOut),
            "CANCELLED" => Ok(SessionState::Cancelled),
            other => Err(DomainError::InvalidRequest(format!(
                "unknown session state: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionState; 8] = [
        SessionState::Created,
        SessionState::AwaitingApproval,
        SessionState::Running,
        SessionState::HandedOff,
        SessionState::Completed,
        SessionState::Failed,
        SessionState::TimedOut,
        SessionState::Cancelled,
    ];

    #[test]
    fn test_forward_transitions() {
        use SessionState::*;
        assert!(Created.can_transition_to(AwaitingApproval));
        assert!(Created.can_transition_to(Running));
        assert!(Created.can_transition_to(HandedOff));
        assert!(Created.can_transition_to(Failed));
        assert!(AwaitingApproval.can_transition_to(Running));
        assert!(AwaitingApproval.can_transition_to(Cancelled));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(TimedOut));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        use SessionState::*;
        assert!(!Running.can_transition_to(AwaitingApproval));
        assert!(!Running.can_transition_to(Created));
        assert!(!AwaitingApproval.can_transition_to(HandedOff));
        assert!(!Running.can_transition_to(HandedOff));
        assert!(!Running.can_transition_to(Running));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_transition_error() {
        let err = SessionState::Completed
            .transition(SessionState::Running)
            .unwrap_err();
        assert!(err.is_transition_error());
        assert_eq!(
            SessionState::Created.transition(SessionState::Running),
            Ok(SessionState::Running)
        );
    }

    #[test]
    fn test_display_and_parse() {
        for state in ALL {
            assert_eq!(state.to_string().parse::<SessionState>().unwrap(), state);
        }
        assert_eq!(
            "awaiting approval".parse::<SessionState>().unwrap(),
            SessionState::AwaitingApproval
        );
        assert_eq!(
            serde_json::to_string(&SessionState::TimedOut).unwrap(),
            "\"TIMED_OUT\""
        );
    }
}
