//! Console output formatter for delegation results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use relay_application::DelegationError;
use relay_domain::{
    AvailabilityReport, CapabilityRegistry, DelegationOutcome, ExecutionResult, ResultErrorKind,
    SessionSnapshot, SetupGuide,
};

/// Formats delegation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a finished (or handed-back) session
    pub fn format_result(result: &ExecutionResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Delegation Result"));
        output.push('\n');

        let state = if result.success {
            result.state.to_string().green().bold()
        } else if result.is_resumable() {
            result.state.to_string().yellow().bold()
        } else {
            result.state.to_string().red().bold()
        };
        output.push_str(&format!("{} {}\n", "Session:".cyan().bold(), result.session));
        output.push_str(&format!("{} {}\n", "State:".cyan().bold(), state));
        output.push_str(&format!(
            "{} {:.1}s\n",
            "Elapsed:".cyan().bold(),
            result.elapsed.as_secs_f64()
        ));

        if result.state_history.len() > 1 {
            let path: Vec<&str> = result.state_history.iter().map(|s| s.as_str()).collect();
            output.push_str(&format!("{} {}\n", "History:".dimmed(), path.join(" -> ").dimmed()));
        }

        if let Some(error) = &result.error {
            let label = match error.kind {
                ResultErrorKind::ApprovalPending => "Waiting:".yellow().bold(),
                _ => "Error:".red().bold(),
            };
            output.push_str(&format!("\n{} {}\n", label, error.message));
            if let Some(remediation) = &error.remediation {
                output.push_str(&format!("{} {}\n", "Next:".green().bold(), remediation));
            }
        }

        if !result.modified_files.is_empty() {
            output.push_str(&Self::section_header("Modified Files"));
            for path in &result.modified_files {
                output.push_str(&format!("  * {}\n", path.display()));
            }
        }

        if !result.log_text.trim().is_empty() {
            output.push_str(&Self::section_header("Session Log"));
            output.push_str(&Self::indent(result.log_text.trim_end(), "  "));
            output.push('\n');
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format the guide shown when no backend is usable
    pub fn format_guide(guide: &SetupGuide) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Setup Required"));
        output.push_str(&format!("\n{}\n", guide.message));

        if let (Some(family), Some(reason)) = (guide.recommendation, &guide.recommendation_reason) {
            output.push_str(&format!(
                "\n{} {} ({})\n",
                "Recommended:".green().bold(),
                family,
                reason
            ));
        }

        for option in &guide.options {
            output.push_str(&Self::section_header(&option.title));
            output.push_str(&format!("{}\n", option.description));
            output.push_str(&format!("{} {}\n", "Currently:".dimmed(), option.reason.dimmed()));
            for pro in &option.pros {
                output.push_str(&format!("  {} {}\n", "+".green(), pro));
            }
            for con in &option.cons {
                output.push_str(&format!("  {} {}\n", "-".red(), con));
            }
            for step in &option.steps {
                output.push_str(&format!("\n  {}. {}\n", step.step, step.action.bold()));
                if let Some(command) = &step.command {
                    output.push_str(&format!("     $ {}\n", command.yellow()));
                }
                for line in &step.instructions {
                    output.push_str(&format!("     {}\n", line));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_outcome(&self, outcome: &DelegationOutcome) -> String {
        match outcome {
            DelegationOutcome::Executed { result } => Self::format_result(result),
            DelegationOutcome::SetupRequired { guide } => Self::format_guide(guide),
        }
    }

    fn format_snapshot(&self, snapshot: &SessionSnapshot) -> String {
        let mut output = format!(
            "{} {}\n{} {}\n",
            "Session:".cyan().bold(),
            snapshot.session,
            "State:".cyan().bold(),
            snapshot.state.to_string().bold()
        );
        if let Some(message) = &snapshot.message {
            output.push_str(&format!("{} {}\n", "Note:".dimmed(), message));
        }
        if !snapshot.modified_files.is_empty() {
            output.push_str(&format!("{}\n", "Modified files:".cyan().bold()));
            for path in &snapshot.modified_files {
                output.push_str(&format!("  * {}\n", path.display()));
            }
        }
        if !snapshot.log_text.trim().is_empty() {
            output.push_str(&format!("{}\n", "Log:".cyan().bold()));
            output.push_str(&Self::indent(snapshot.log_text.trim_end(), "  "));
            output.push('\n');
        }
        output
    }

    fn format_agents(&self, registry: &CapabilityRegistry, report: &AvailabilityReport) -> String {
        let mut output = Self::section_header("Agents");
        for descriptor in registry.capability_matrix() {
            let status = if report.is_available(descriptor.kind) {
                "available".green()
            } else {
                "unavailable".red()
            };
            output.push_str(&format!(
                "\n{} ({}) {}\n",
                descriptor.display_name().bold(),
                descriptor.kind,
                status
            ));
            output.push_str(&format!(
                "  async: {}  plan approval: {}  max context: {} lines\n",
                yes_no(descriptor.supports_async),
                yes_no(descriptor.supports_plan_approval),
                descriptor.max_context_size
            ));
            if !report.is_available(descriptor.kind) {
                output.push_str(&format!(
                    "  {} {}\n",
                    "reason:".dimmed(),
                    report.reason_for(descriptor.kind)
                ));
            }
        }
        output
    }

    fn format_error(&self, error: &DelegationError) -> String {
        let mut output = format!("{} {}\n", "Error:".red().bold(), error);
        if let Some(remediation) = error.remediation() {
            output.push_str(&format!("{} {}\n", "Next:".green().bold(), remediation));
        }
        output
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
