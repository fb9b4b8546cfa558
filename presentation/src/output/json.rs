//! JSON output for scripting and tool integrations

use crate::output::formatter::OutputFormatter;
use relay_application::DelegationError;
use relay_domain::{AvailabilityReport, CapabilityRegistry, DelegationOutcome, SessionSnapshot};
use serde::Serialize;
use serde_json::json;

/// Formats results as pretty-printed JSON
pub struct JsonFormatter;

impl JsonFormatter {
    fn render<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_outcome(&self, outcome: &DelegationOutcome) -> String {
        Self::render(outcome)
    }

    fn format_snapshot(&self, snapshot: &SessionSnapshot) -> String {
        Self::render(snapshot)
    }

    fn format_agents(&self, registry: &CapabilityRegistry, report: &AvailabilityReport) -> String {
        let agents: Vec<_> = registry
            .capability_matrix()
            .into_iter()
            .map(|descriptor| {
                json!({
                    "agent": descriptor,
                    "available": report.is_available(descriptor.kind),
                    "reason": (!report.is_available(descriptor.kind))
                        .then(|| report.reason_for(descriptor.kind)),
                })
            })
            .collect();
        Self::render(&json!({ "agents": agents }))
    }

    fn format_error(&self, error: &DelegationError) -> String {
        Self::render(&json!({
            "status": "error",
            "error": error.to_string(),
            "backend": error.backend(),
            "remediation": error.remediation(),
        }))
    }
}
