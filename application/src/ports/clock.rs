//! Clock port.
//!
//! Poll loops, deadlines and cache TTLs read time through [`Clock`] so tests
//! can simulate elapsed time without real delays.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Source of monotonic time and sleeps.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Real time, backed by tokio's timer.
///
/// `now` reads tokio's clock so deadlines follow the same time source as
/// `sleep`, including when the timer is paused in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated time for tests running on tokio's paused timer
/// (`#[tokio::test(start_paused = true)]`).
///
/// The runtime only jumps to the next timer once every task is idle, so
/// racing sleeps resolve in deadline order and no test waits in real time.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    origin: tokio::time::Instant,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }

    pub async fn advance(&self, duration: Duration) {
        tokio::time::advance(duration).await;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
