//! Shared utilities for use cases.
//!
//! Contains cancellation checking, transient-error retry, and bounded
//! backend cancellation used by every session manager.

use crate::config::RetryPolicy;
use crate::ports::backend_error::BackendError;
use crate::ports::clock::Clock;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why a retried call stopped without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallError {
    Cancelled,
    Backend(BackendError),
}

/// Run `call`, retrying transient errors with bounded backoff.
///
/// The token is observed while a call is in flight and during each backoff
/// sleep. Non-transient errors are returned immediately.
pub(crate) async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    token: &CancellationToken,
    operation: &str,
    mut call: F,
) -> Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0;
    loop {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(CallError::Cancelled),
            outcome = call() => outcome,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                warn!(
                    operation,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying backend call"
                );
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(CallError::Cancelled),
                    _ = clock.sleep(delay) => {}
                }
            }
            Err(e) => return Err(CallError::Backend(e)),
        }
    }
}

/// Ask a backend to cancel, waiting at most `grace`.
///
/// Returns whether the backend acknowledged in time. Callers report the
/// session cancelled either way.
pub(crate) async fn cancel_with_grace<Fut>(clock: &dyn Clock, grace: Duration, cancel: Fut) -> bool
where
    Fut: Future<Output = Result<(), BackendError>>,
{
    tokio::select! {
        result = cancel => match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Backend rejected cancellation");
                false
            }
        },
        _ = clock.sleep(grace) => {
            debug!(grace_ms = grace.as_millis() as u64, "Backend did not acknowledge cancellation in time");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::ManualClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_errors() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_transient(
            &RetryPolicy::default(),
            &clock,
            &CancellationToken::new(),
            "poll",
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendError::Transient("503".into()))
                } else {
                    Ok(7)
                }
            },
        )
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 500ms + 1000ms (plus jitter on the second attempt)
        assert!(clock.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_is_bounded() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_transient(
            &RetryPolicy::default().with_max_retries(2),
            &clock,
            &CancellationToken::new(),
            "poll",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Transient("timeout".into()))
            },
        )
        .await;
        assert_eq!(
            result,
            Err(CallError::Backend(BackendError::Transient("timeout".into())))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_structural_errors_are_not_retried() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_transient(
            &RetryPolicy::default(),
            &clock,
            &CancellationToken::new(),
            "poll",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Rejected("bad".into()))
            },
        )
        .await;
        assert!(matches!(result, Err(CallError::Backend(BackendError::Rejected(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_stops_in_flight_call() {
        let clock = ManualClock::new();
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<(), _> = retry_transient(
            &RetryPolicy::default(),
            &clock,
            &token,
            "poll",
            || std::future::pending(),
        )
        .await;
        assert_eq!(result, Err(CallError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_with_grace_does_not_wait_forever() {
        let clock = ManualClock::new();
        let acknowledged =
            cancel_with_grace(&clock, Duration::from_secs(5), std::future::pending()).await;
        assert!(!acknowledged);
        assert_eq!(clock.elapsed(), Duration::from_secs(5));

        assert!(cancel_with_grace(&clock, Duration::from_secs(5), async { Ok(()) }).await);
    }
}
