//! Availability report produced by probing the environment.
//!
//! A report is a plain value: it is recomputed for each delegation (or taken
//! from a short-lived cache) because local login state can change between calls.

use super::kind::{BackendFamily, BackendKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Individual facts gathered while probing a family.
///
/// Used by the setup guide to decide which remediation steps are needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeDetails {
    /// Remote: a credential was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_present: Option<bool>,
    /// Remote: the HTTP client was compiled in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_installed: Option<bool>,
    /// Local: the binary resolves on PATH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_installed: Option<bool>,
    /// Local: where the binary was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<String>,
    /// Local: the session listing succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_in: Option<bool>,
    /// Local: reported tool version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Availability of one backend family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_if_unavailable: Option<String>,
    #[serde(default)]
    pub details: ProbeDetails,
}

impl BackendAvailability {
    pub fn available(details: ProbeDetails) -> Self {
        Self {
            available: true,
            reason_if_unavailable: None,
            details,
        }
    }

    pub fn unavailable(reason: impl Into<String>, details: ProbeDetails) -> Self {
        Self {
            available: false,
            reason_if_unavailable: Some(reason.into()),
            details,
        }
    }

    pub fn reason(&self) -> &str {
        self.reason_if_unavailable.as_deref().unwrap_or("available")
    }
}

/// Availability of every backend family at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    families: BTreeMap<BackendFamily, BackendAvailability>,
}

impl AvailabilityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: BackendFamily, availability: BackendAvailability) -> Self {
        self.families.insert(family, availability);
        self
    }

    /// Availability of a family. Families that were never probed are absent.
    pub fn family(&self, family: BackendFamily) -> Option<&BackendAvailability> {
        self.families.get(&family)
    }

    pub fn for_kind(&self, kind: BackendKind) -> Option<&BackendAvailability> {
        self.family(kind.family())
    }

    pub fn is_available(&self, kind: BackendKind) -> bool {
        self.for_kind(kind).is_some_and(|a| a.available)
    }

    /// Reason a backend cannot be used; unprobed families report "not probed".
    pub fn reason_for(&self, kind: BackendKind) -> String {
        match self.for_kind(kind) {
            Some(a) if a.available => "available".to_string(),
            Some(a) => a.reason().to_string(),
            None => "not probed".to_string(),
        }
    }

    pub fn any_available(&self) -> bool {
        self.families.values().any(|a| a.available)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BackendFamily, &BackendAvailability)> {
        self.families.iter()
    }

    /// Merge another report into this one, replacing overlapping families.
    pub fn merge(mut self, other: AvailabilityReport) -> Self {
        self.families.extend(other.families);
        self
    }
}
