//! Backend activity stream.
//!
//! A remote session records what the agent did as an ordered list of
//! activities. On completion the stream is walked once to derive the set of
//! modified files and a human-readable log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

const MESSAGE_PREVIEW_CHARS: usize = 100;
const FILES_PREVIEW: usize = 5;

/// What an activity records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    PlanGenerated { steps: Vec<String> },
    AgentMessage { message: String },
    CodeChange { files: Vec<PathBuf> },
    Other,
}

/// A single entry in a session's activity stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub description: String,
    pub originator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    pub kind: ActivityKind,
}

impl Activity {
    pub fn new(id: impl Into<String>, description: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            originator: "agent".to_string(),
            create_time: None,
            kind,
        }
    }

    pub fn with_originator(mut self, originator: impl Into<String>) -> Self {
        self.originator = originator.into();
        self
    }

    pub fn with_create_time(mut self, time: DateTime<Utc>) -> Self {
        self.create_time = Some(time);
        self
    }

    pub fn changed_files(&self) -> &[PathBuf] {
        match &self.kind {
            ActivityKind::CodeChange { files } => files,
            _ => &[],
        }
    }
}

/// Order activities chronologically.
///
/// Sorting only happens when every entry carries a timestamp; otherwise the
/// backend's order is kept as-is. The sort is stable so equal timestamps keep
/// their reported order.
pub fn chronological(activities: &[Activity]) -> Vec<&Activity> {
    let mut ordered: Vec<&Activity> = activities.iter().collect();
    if ordered.iter().all(|a| a.create_time.is_some()) {
        ordered.sort_by_key(|a| a.create_time);
    }
    ordered
}

/// Collect every path named by a code-change activity.
pub fn collect_modified_files(activities: &[Activity]) -> BTreeSet<PathBuf> {
    chronological(activities)
        .into_iter()
        .flat_map(|a| a.changed_files().iter().cloned())
        .collect()
}

/// Render the activity stream as a numbered log.
pub fn format_activity_log(activities: &[Activity]) -> String {
    let mut lines = vec!["Session Activity Log:".to_string(), "=".repeat(50)];

    for (i, activity) in chronological(activities).into_iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. {}", i + 1, activity.description));
        if let Some(time) = activity.create_time {
            lines.push(format!("   Time: {}", time.to_rfc3339()));
        }
        lines.push(format!("   Originator: {}", activity.originator));

        match &activity.kind {
            ActivityKind::AgentMessage { message } if !message.is_empty() => {
                let preview: String = message.chars().take(MESSAGE_PREVIEW_CHARS).collect();
                if preview.len() < message.len() {
                    lines.push(format!("   Message: {}...", preview));
                } else {
                    lines.push(format!("   Message: {}", preview));
                }
            }
            ActivityKind::PlanGenerated { steps } => {
                lines.push(format!("   Plan: {} step(s)", steps.len()));
            }
            ActivityKind::CodeChange { files } if !files.is_empty() => {
                let shown: Vec<String> = files
                    .iter()
                    .take(FILES_PREVIEW)
                    .map(|p| p.display().to_string())
                    .collect();
                lines.push(format!("   Files changed: {}", shown.join(", ")));
            }
            _ => {}
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn change(id: &str, files: &[&str], secs: i64) -> Activity {
        Activity::new(
            id,
            format!("change {}", id),
            ActivityKind::CodeChange {
                files: files.iter().map(PathBuf::from).collect(),
            },
        )
        .with_create_time(at(secs))
    }

    #[test]
    fn test_collect_modified_files_deduplicates() {
        let activities = vec![
            change("a2", &["src/lib.rs", "README.md"], 20),
            Activity::new(
                "m1",
                "thinking",
                ActivityKind::AgentMessage {
                    message: "Looking around".into(),
                },
            )
            .with_create_time(at(5)),
            change("a1", &["src/lib.rs"], 10),
        ];

        let files = collect_modified_files(&activities);
        let files: Vec<_> = files.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(files, vec!["README.md", "src/lib.rs"]);
    }

    #[test]
    fn test_log_is_chronological() {
        let activities = vec![change("late", &["b.rs"], 20), change("early", &["a.rs"], 10)];
        let log = format_activity_log(&activities);

        let early = log.find("change early").unwrap();
        let late = log.find("change late").unwrap();
        assert!(early < late);
        assert!(log.contains("1. change early"));
        assert!(log.contains("Files changed: a.rs"));
    }

    #[test]
    fn test_missing_timestamps_keep_backend_order() {
        let activities = vec![
            Activity::new("2", "second", ActivityKind::Other),
            change("1", &["x.rs"], 0),
        ];
        let ordered = chronological(&activities);
        assert_eq!(ordered[0].id, "2");
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let long = "x".repeat(150);
        let activities = vec![Activity::new(
            "m",
            "message",
            ActivityKind::AgentMessage {
                message: long.clone(),
            },
        )];
        let log = format_activity_log(&activities);
        assert!(log.contains(&format!("Message: {}...", "x".repeat(100))));
        assert!(!log.contains(&long));
    }
}
