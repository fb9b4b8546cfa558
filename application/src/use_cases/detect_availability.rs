//! Backend availability detection.
//!
//! [`ModeDetector`] probes backend families through the
//! [`AvailabilityProbe`] port and returns an explicit [`AvailabilityReport`]
//! value. [`AvailabilityCache`] optionally reuses a report for a short TTL;
//! refreshes are single-flight, so concurrent callers share one probe.

use crate::ports::availability_probe::AvailabilityProbe;
use crate::ports::clock::Clock;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use relay_domain::{AvailabilityReport, BackendFamily};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Probes backend families.
#[derive(Clone)]
pub struct ModeDetector {
    probe: Arc<dyn AvailabilityProbe>,
}

impl ModeDetector {
    pub fn new(probe: Arc<dyn AvailabilityProbe>) -> Self {
        Self { probe }
    }

    /// Probe every family concurrently.
    pub async fn probe(&self) -> AvailabilityReport {
        let (remote, local) = tokio::join!(
            self.probe.probe_family(BackendFamily::Remote),
            self.probe.probe_family(BackendFamily::Local),
        );
        debug!(
            remote = remote.available,
            local = local.available,
            "Probed backend availability"
        );
        AvailabilityReport::new()
            .with_family(BackendFamily::Remote, remote)
            .with_family(BackendFamily::Local, local)
    }

    /// Probe one family. The report contains only that family.
    pub async fn probe_family(&self, family: BackendFamily) -> AvailabilityReport {
        let availability = self.probe.probe_family(family).await;
        debug!(%family, available = availability.available, "Probed backend family");
        AvailabilityReport::new().with_family(family, availability)
    }
}

type SharedProbe = Shared<BoxFuture<'static, AvailabilityReport>>;

enum CacheState {
    Empty,
    Ready {
        report: AvailabilityReport,
        at: Instant,
    },
    Refreshing(SharedProbe),
}

/// Short-TTL, single-flight availability cache.
///
/// The lock is only held to inspect or swap state, never across an await.
/// A TTL of zero disables reuse but keeps single-flight refreshes.
pub struct AvailabilityCache {
    detector: ModeDetector,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl AvailabilityCache {
    pub fn new(detector: ModeDetector, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            detector,
            clock,
            ttl,
            state: Mutex::new(CacheState::Empty),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current report, probing if the cached one is stale or absent.
    pub async fn get(&self) -> AvailabilityReport {
        let refresh = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match &*state {
                CacheState::Ready { report, at }
                    if self.clock.now().saturating_duration_since(*at) < self.ttl =>
                {
                    return report.clone();
                }
                CacheState::Refreshing(shared) => shared.clone(),
                _ => {
                    let detector = self.detector.clone();
                    let shared = async move { detector.probe().await }.boxed().shared();
                    *state = CacheState::Refreshing(shared.clone());
                    shared
                }
            }
        };

        let report = refresh.clone().await;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let CacheState::Refreshing(current) = &*state
            && current.ptr_eq(&refresh)
        {
            *state = CacheState::Ready {
                report: report.clone(),
                at: self.clock.now(),
            };
        }
        report
    }

    /// Drop any cached report; the next `get` probes again.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(&*state, CacheState::Ready { .. }) {
            *state = CacheState::Empty;
        }
    }
}
