//! Backend status vocabulary.
//!
//! Maps the status words a backend reports (structured or free text) onto
//! [`SessionState`]. Unknown words yield `None`, which callers treat as "keep
//! waiting".

use super::state::SessionState;

/// Map a single status word to a session state.
pub fn map_status_word(word: &str) -> Option<SessionState> {
    let normalized = word
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
        .to_uppercase()
        .replace([' ', '-'], "_");
    let state = match normalized.as_str() {
        "COMPLETED" | "COMPLETE" | "DONE" | "SUCCEEDED" | "FINISHED" => SessionState::Completed,
        "FAILED" | "ERROR" => SessionState::Failed,
        "CANCELLED" | "CANCELED" => SessionState::Cancelled,
        "AWAITING_PLAN_APPROVAL" | "AWAITING_APPROVAL" => SessionState::AwaitingApproval,
        "RUNNING" | "IN_PROGRESS" | "AWAITING_USER_FEEDBACK" | "PAUSED" => SessionState::Running,
        // A plan is still being drafted; nothing has executed yet.
        "PENDING" | "QUEUED" | "PLANNING" | "CREATED" | "STATE_UNSPECIFIED" => SessionState::Created,
        _ => return None,
    };
    Some(state)
}

const FALLBACK_KEYWORDS: [&str; 4] = ["COMPLETED", "FAILED", "RUNNING", "PENDING"];

/// Extract a session state from free-form command output.
///
/// A `status: <word>` line wins; otherwise the first known keyword found
/// anywhere in the output (checked in order completed, failed, running,
/// pending).
pub fn parse_status_text(output: &str) -> Option<SessionState> {
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.to_lowercase().contains("status") {
            if let Some(state) = map_status_word(value) {
                return Some(state);
            }
        }
    }

    let upper = output.to_uppercase();
    FALLBACK_KEYWORDS
        .iter()
        .find(|keyword| upper.contains(*keyword))
        .and_then(|keyword| map_status_word(keyword))
}
