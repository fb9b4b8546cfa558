//! Polling configuration from TOML (`[polling]` section)

use relay_application::{DelegationParams, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw polling configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePollingConfig {
    pub interval_seconds: u64,
    /// Wall-clock budget for one wait
    pub timeout_seconds: u64,
    /// Availability report reuse; 0 probes every time
    pub probe_cache_seconds: u64,
    pub cancel_grace_seconds: u64,
    /// Retries for transient backend errors
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for FilePollingConfig {
    fn default() -> Self {
        let params = DelegationParams::default();
        Self {
            interval_seconds: params.poll_interval.as_secs(),
            timeout_seconds: params.timeout.as_secs(),
            probe_cache_seconds: params.probe_ttl.as_secs(),
            cancel_grace_seconds: params.cancel_grace.as_secs(),
            max_retries: params.retry.max_retries,
            initial_delay_ms: params.retry.initial_delay_ms,
            max_delay_ms: params.retry.max_delay_ms,
        }
    }
}

impl FilePollingConfig {
    pub fn to_params(&self) -> DelegationParams {
        let retry = RetryPolicy {
            max_retries: self.max_retries,
            initial_delay_ms: self.initial_delay_ms,
            max_delay_ms: self.max_delay_ms,
            ..RetryPolicy::default()
        };
        DelegationParams::default()
            .with_poll_interval(Duration::from_secs(self.interval_seconds))
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_probe_ttl(Duration::from_secs(self.probe_cache_seconds))
            .with_cancel_grace(Duration::from_secs(self.cancel_grace_seconds))
            .with_retry(retry)
    }
}
