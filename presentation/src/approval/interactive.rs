//! Interactive plan approval on the terminal

use async_trait::async_trait;
use colored::Colorize;
use relay_application::{ApprovalDecision, PlanApprovalError, PlanApprovalPort, PlanReview};
use std::io::{self, BufRead, IsTerminal, Write};

/// Asks the user on stdin whether to approve a generated plan.
///
/// Without a terminal the plan is deferred so the session can be approved
/// later with `agent-relay approve`.
pub struct InteractivePlanApproval;

impl InteractivePlanApproval {
    pub fn new() -> Self {
        Self
    }

    fn display_review(review: &PlanReview) {
        eprintln!();
        eprintln!("{}", "=".repeat(60).yellow());
        eprintln!("{}", "  Plan approval required".yellow().bold());
        eprintln!("{}", "=".repeat(60).yellow());
        eprintln!("{} {}", "Session:".cyan().bold(), review.session);
        eprintln!("{} {}", "Task:".cyan().bold(), review.prompt.dimmed());
        if review.steps.is_empty() {
            eprintln!("{}", "(the backend did not describe its plan)".dimmed());
        } else {
            eprintln!("{}", "Plan:".cyan().bold());
            for (i, step) in review.steps.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, step);
            }
        }
        eprintln!();
        eprintln!("{}  - Let the backend execute this plan", "approve".green());
        eprintln!("{}   - Cancel the session", "reject".red());
        eprintln!("{}    - Decide later (agent-relay approve {})", "defer".yellow(), review.session);
    }

    /// Prompt until a recognisable answer arrives. End of input defers.
    fn read_decision() -> Result<ApprovalDecision, PlanApprovalError> {
        let stdin = io::stdin();
        loop {
            eprint!("{} ", "approve/reject/defer>".magenta().bold());
            io::stderr().flush().map_err(|e| {
                PlanApprovalError::IoError(format!("Failed to flush stderr: {}", e))
            })?;

            let mut input = String::new();
            let read = stdin
                .lock()
                .read_line(&mut input)
                .map_err(|e| PlanApprovalError::IoError(format!("Failed to read input: {}", e)))?;
            if read == 0 {
                return Ok(ApprovalDecision::Defer);
            }

            match parse_decision(&input) {
                Some(decision) => return Ok(decision),
                None if input.trim().is_empty() => continue,
                None => eprintln!("Unknown answer: {}", input.trim().red()),
            }
        }
    }
}

impl Default for InteractivePlanApproval {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a typed answer to a decision.
pub fn parse_decision(input: &str) -> Option<ApprovalDecision> {
    match input.trim().to_lowercase().as_str() {
        "approve" | "a" | "y" | "yes" => Some(ApprovalDecision::Approve),
        "reject" | "r" | "n" | "no" => Some(ApprovalDecision::Reject),
        "defer" | "d" | "later" | "q" => Some(ApprovalDecision::Defer),
        _ => None,
    }
}

#[async_trait]
impl PlanApprovalPort for InteractivePlanApproval {
    async fn review_plan(&self, review: &PlanReview) -> Result<ApprovalDecision, PlanApprovalError> {
        if !io::stdin().is_terminal() {
            return Ok(ApprovalDecision::Defer);
        }

        Self::display_review(review);
        let decision = tokio::task::spawn_blocking(Self::read_decision)
            .await
            .map_err(|e| PlanApprovalError::IoError(e.to_string()))??;

        match decision {
            ApprovalDecision::Approve => eprintln!("{}", "Plan approved".green()),
            ApprovalDecision::Reject => eprintln!("{}", "Plan rejected".red()),
            ApprovalDecision::Defer => eprintln!("{}", "Approval deferred".yellow()),
        }
        Ok(decision)
    }
}
