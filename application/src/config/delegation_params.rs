//! Delegation parameters: polling, time budgets, and approval behavior.
//!
//! [`DelegationParams`] groups the static parameters the session managers
//! and the availability cache read. These are application-layer concerns,
//! not domain policy.

use super::retry_policy::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session driving parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationParams {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Wall-clock budget for one wait loop. Exceeding it yields `TIMED_OUT`.
    pub timeout: Duration,
    /// Approve generated plans without consulting the approval port.
    pub auto_approve: bool,
    /// How long an availability report may be reused. Zero disables reuse.
    pub probe_ttl: Duration,
    /// Upper bound on waiting for a backend to acknowledge cancellation.
    pub cancel_grace: Duration,
    /// Retry policy for transient poll errors.
    pub retry: RetryPolicy,
}

impl Default for DelegationParams {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(30 * 60),
            auto_approve: false,
            probe_ttl: Duration::from_secs(30),
            cancel_grace: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

impl DelegationParams {
    // ==================== Builder Methods ====================

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_probe_ttl(mut self, ttl: Duration) -> Self {
        self.probe_ttl = ttl;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
