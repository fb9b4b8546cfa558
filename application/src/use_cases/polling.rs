//! Deadline-bounded status polling.
//!
//! One poll per interval until the observer says stop, the wall-clock
//! deadline passes, the token is cancelled, or the backend keeps failing.
//! Each poll (retries and backoff included) races the deadline, so a slow
//! or flapping backend cannot stretch the wait past its budget.
//!
//! ```text
//! poll (until deadline) ──deadline──> TimedOut
//!      │
//!      ▼
//!    stop? ──yes──> Reached(state)
//!      │no
//!      ▼
//! past deadline? ──yes──> TimedOut
//!      │no
//!      ▼
//! sleep min(interval, remaining) ──> poll
//! ```

use super::shared::{CallError, retry_transient};
use crate::config::RetryPolicy;
use crate::ports::backend_error::BackendError;
use crate::ports::clock::Clock;
use relay_domain::SessionState;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollExit {
    /// The observer accepted this state.
    Reached(SessionState),
    TimedOut,
    Cancelled,
    /// A non-transient error, or transient errors beyond the retry budget
    /// that ran out before the deadline.
    Failed(BackendError),
}

/// Timing inputs shared by every phase of one session's wait.
pub(crate) struct PollSchedule<'a> {
    pub clock: &'a dyn Clock,
    pub interval: Duration,
    pub deadline: Instant,
    pub retry: &'a RetryPolicy,
    pub token: &'a CancellationToken,
}

impl<'a> PollSchedule<'a> {
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(self.clock.now())
    }
}

/// Poll until `observe` returns `true` for a reported state.
///
/// `poll` yields `None` when the backend's status could not be interpreted;
/// that counts as "keep waiting".
pub(crate) async fn poll_until<F, Fut, O>(
    schedule: &PollSchedule<'_>,
    operation: &str,
    mut poll: F,
    mut observe: O,
) -> PollExit
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<SessionState>, BackendError>>,
    O: FnMut(SessionState) -> bool,
{
    loop {
        if schedule.token.is_cancelled() {
            return PollExit::Cancelled;
        }

        let polled = tokio::select! {
            biased;
            polled = retry_transient(
                schedule.retry,
                schedule.clock,
                schedule.token,
                operation,
                &mut poll,
            ) => polled,
            _ = schedule.clock.sleep(schedule.remaining()) => {
                debug!(operation, "Deadline reached while waiting on the backend");
                return PollExit::TimedOut;
            }
        };

        match polled {
            Err(CallError::Cancelled) => return PollExit::Cancelled,
            Err(CallError::Backend(e)) => return PollExit::Failed(e),
            Ok(Some(state)) if observe(state) => return PollExit::Reached(state),
            Ok(_) => {}
        }

        let remaining = schedule.remaining();
        if remaining.is_zero() {
            return PollExit::TimedOut;
        }

        tokio::select! {
            biased;
            _ = schedule.token.cancelled() => return PollExit::Cancelled,
            _ = schedule.clock.sleep(schedule.interval.min(remaining)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::ManualClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn schedule<'a>(
        clock: &'a ManualClock,
        retry: &'a RetryPolicy,
        token: &'a CancellationToken,
        interval: u64,
        budget: u64,
    ) -> PollSchedule<'a> {
        PollSchedule {
            clock,
            interval: Duration::from_secs(interval),
            deadline: clock.now() + Duration::from_secs(budget),
            retry,
            token,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_times_out_within_budget() {
        let clock = ManualClock::new();
        let retry = RetryPolicy::default();
        let token = CancellationToken::new();
        let schedule = schedule(&clock, &retry, &token, 1, 3);

        let exit = poll_until(
            &schedule,
            "status",
            || async { Ok(Some(SessionState::Running)) },
            |state| state.is_terminal(),
        )
        .await;

        assert_eq!(exit, PollExit::TimedOut);
        assert!(clock.elapsed() >= Duration::from_secs(3));
        assert!(clock.elapsed() <= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_state_ends_immediately() {
        let clock = ManualClock::new();
        let retry = RetryPolicy::default();
        let token = CancellationToken::new();
        let schedule = schedule(&clock, &retry, &token, 1, 3);
        let polls = AtomicU32::new(0);
        let counter = &polls;

        let exit = poll_until(
            &schedule,
            "status",
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                    Ok(Some(SessionState::Completed))
                } else {
                    Ok(None)
                }
            },
            |state| state.is_terminal(),
        )
        .await;

        assert_eq!(exit, PollExit::Reached(SessionState::Completed));
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_longer_than_budget_is_clamped() {
        let clock = ManualClock::new();
        let retry = RetryPolicy::default();
        let token = CancellationToken::new();
        let schedule = schedule(&clock, &retry, &token, 10, 3);

        let exit = poll_until(
            &schedule,
            "status",
            || async { Ok(None) },
            |_| false,
        )
        .await;

        assert_eq!(exit, PollExit::TimedOut);
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_observed_between_polls() {
        let clock = ManualClock::new();
        let retry = RetryPolicy::default();
        let token = CancellationToken::new();
        let schedule = schedule(&clock, &retry, &token, 1, 60);
        let polls = AtomicU32::new(0);
        let counter = &polls;
        let cancel = token.clone();

        let exit = poll_until(
            &schedule,
            "status",
            move || {
                let cancel = cancel.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 2 {
                        cancel.cancel();
                    }
                    Ok(Some(SessionState::Running))
                }
            },
            |state| state.is_terminal(),
        )
        .await;

        assert_eq!(exit, PollExit::Cancelled);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_poll_is_cut_off_at_deadline() {
        let clock = ManualClock::new();
        let retry = RetryPolicy::default();
        let token = CancellationToken::new();
        let schedule = schedule(&clock, &retry, &token, 1, 3);
        let slow = &clock;

        let exit = poll_until(
            &schedule,
            "status",
            move || async move {
                slow.sleep(Duration::from_secs(20)).await;
                Ok(Some(SessionState::Running))
            },
            |state| state.is_terminal(),
        )
        .await;

        assert_eq!(exit, PollExit::TimedOut);
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_transient_errors_end_as_timeout() {
        let clock = ManualClock::new();
        let retry = RetryPolicy::default();
        let token = CancellationToken::new();
        let schedule = schedule(&clock, &retry, &token, 1, 3);
        let polls = AtomicU32::new(0);
        let counter = &polls;

        let exit = poll_until(
            &schedule,
            "status",
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Ok(Some(SessionState::Running))
                } else {
                    Err(BackendError::Transient("503".into()))
                }
            },
            |state| state.is_terminal(),
        )
        .await;

        assert_eq!(exit, PollExit::TimedOut);
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_failure_is_reported() {
        let clock = ManualClock::new();
        let retry = RetryPolicy::none();
        let token = CancellationToken::new();
        let schedule = schedule(&clock, &retry, &token, 1, 60);

        let exit = poll_until(
            &schedule,
            "status",
            || async { Err(BackendError::NotFound("session 5".into())) },
            |_| true,
        )
        .await;

        assert_eq!(exit, PollExit::Failed(BackendError::NotFound("session 5".into())));
    }
}
