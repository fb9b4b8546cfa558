//! Bounded exponential backoff for transient backend errors.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often and how patiently a transient failure is retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_delay_ms`.
    ///
    /// Adds up to 10% deterministic jitter so concurrent sessions do not
    /// retry in lockstep.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let jitter = (base * 0.1 * jitter_fraction(attempt)) as u64;
        let delay = (base as u64).saturating_add(jitter);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

fn jitter_fraction(attempt: u32) -> f64 {
    let x = attempt.wrapping_mul(2_654_435_761);
    (x % 100) as f64 / 100.0
}
