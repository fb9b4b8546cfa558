//! Availability probe port.

use async_trait::async_trait;
use relay_domain::{BackendAvailability, BackendFamily};

/// Checks whether one backend family is usable right now.
///
/// Probes never fail: problems are reported as an unavailable result with a
/// reason.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    async fn probe_family(&self, family: BackendFamily) -> BackendAvailability;
}
