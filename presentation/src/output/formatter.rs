//! Output formatter trait

use relay_application::DelegationError;
use relay_domain::{AvailabilityReport, CapabilityRegistry, DelegationOutcome, SessionSnapshot};

/// Trait for rendering delegation results
pub trait OutputFormatter {
    /// Format the outcome of `delegate`
    fn format_outcome(&self, outcome: &DelegationOutcome) -> String;

    /// Format a status query
    fn format_snapshot(&self, snapshot: &SessionSnapshot) -> String;

    /// Format the capability matrix next to current availability
    fn format_agents(&self, registry: &CapabilityRegistry, report: &AvailabilityReport) -> String;

    /// Format a structural failure
    fn format_error(&self, error: &DelegationError) -> String;
}
