//! Setup guidance for when no backend is usable.
//!
//! Each unavailable family gets one [`SetupOption`] whose steps are derived
//! from the probe details, so a user who only needs to log in is not told to
//! reinstall anything. Options are ranked simplest-first: fewest steps, with
//! ties going to the local CLI.

use crate::backend::availability::{AvailabilityReport, BackendAvailability, ProbeDetails};
use crate::backend::kind::BackendFamily;
use serde::{Deserialize, Serialize};

pub const REGISTRATION_URL: &str = "https://jules.google/";

/// Names that appear in generated commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupHints {
    /// Local CLI binary name.
    pub binary: String,
    /// Environment variable holding the remote credential.
    pub credential_env: String,
}

impl Default for SetupHints {
    fn default() -> Self {
        Self {
            binary: "jules".to_string(),
            credential_env: "JULES_API_KEY".to_string(),
        }
    }
}

/// One concrete remediation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupStep {
    pub step: usize,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
}

/// Remediation path for one backend family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupOption {
    pub family: BackendFamily,
    pub title: String,
    pub description: String,
    /// Why the family is currently unusable.
    pub reason: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub steps: Vec<SetupStep>,
}

/// Ranked remediation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupGuide {
    pub message: String,
    pub options: Vec<SetupOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<BackendFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
}

impl SetupGuide {
    pub fn option(&self, family: BackendFamily) -> Option<&SetupOption> {
        self.options.iter().find(|o| o.family == family)
    }
}

/// Build a ranked guide for every family that is not available.
///
/// Families missing from the report are treated as unavailable.
pub fn generate_setup_guide(report: &AvailabilityReport, hints: &SetupHints) -> SetupGuide {
    let mut options: Vec<SetupOption> = BackendFamily::ALL
        .iter()
        .filter_map(|family| {
            let availability = report.family(*family);
            if availability.is_some_and(|a| a.available) {
                return None;
            }
            let (reason, details) = match availability {
                Some(a) => (a.reason().to_string(), a.details.clone()),
                None => ("not probed".to_string(), ProbeDetails::default()),
            };
            Some(match family {
                BackendFamily::Local => local_option(reason, &details, hints),
                BackendFamily::Remote => remote_option(reason, &details, hints),
            })
        })
        .collect();

    // Stable sort keeps local ahead of remote on ties.
    options.sort_by_key(|o| (o.steps.len(), family_rank(o.family)));

    let (recommendation, recommendation_reason) = recommend(report, &options, hints);

    SetupGuide {
        message: "No backend is fully configured. Choose a setup option below.".to_string(),
        options,
        recommendation,
        recommendation_reason,
    }
}

fn family_rank(family: BackendFamily) -> u8 {
    match family {
        BackendFamily::Local => 0,
        BackendFamily::Remote => 1,
    }
}

fn numbered(steps: Vec<(String, Option<String>, Vec<String>)>) -> Vec<SetupStep> {
    steps
        .into_iter()
        .enumerate()
        .map(|(i, (action, command, instructions))| SetupStep {
            step: i + 1,
            action,
            command,
            instructions,
        })
        .collect()
}

fn local_option(reason: String, details: &ProbeDetails, hints: &SetupHints) -> SetupOption {
    let bin = &hints.binary;
    let mut steps = Vec::new();

    if details.binary_installed != Some(true) {
        steps.push((
            format!("Install the {} CLI", bin),
            None,
            vec![
                format!("Download from: {}", REGISTRATION_URL),
                format!("macOS: brew install {}", bin),
                format!("Make sure `{}` is on your PATH", bin),
            ],
        ));
    }
    if details.logged_in != Some(true) {
        steps.push((
            format!("Log in to {}", bin),
            Some(format!("{} login", bin)),
            vec![
                format!("Run: {} login", bin),
                "Follow the browser authentication flow".to_string(),
                format!("Verify with: {} remote list", bin),
            ],
        ));
    }

    SetupOption {
        family: BackendFamily::Local,
        title: "Local CLI (quick start)".to_string(),
        description: "Runs sessions through the local command-line tool".to_string(),
        reason,
        pros: vec![
            "No API key required".to_string(),
            "Easy setup (just log in)".to_string(),
            "Fast feedback".to_string(),
        ],
        cons: vec![
            "Blocks during execution".to_string(),
            "Smaller context than the remote API".to_string(),
        ],
        steps: numbered(steps),
    }
}

fn remote_option(reason: String, details: &ProbeDetails, hints: &SetupHints) -> SetupOption {
    let env = &hints.credential_env;
    let mut steps = Vec::new();

    if details.client_installed == Some(false) {
        steps.push((
            "Rebuild with the remote API client".to_string(),
            Some("cargo install agent-relay --features remote-api".to_string()),
            Vec::new(),
        ));
    }
    if details.credential_present != Some(true) {
        steps.push((
            "Get an API key".to_string(),
            None,
            vec![
                format!("Go to {}", REGISTRATION_URL),
                "Sign in and open Settings -> API Keys".to_string(),
                "Create a new API key and copy it".to_string(),
            ],
        ));
        steps.push((
            format!("Export {}", env),
            Some(format!("export {}=<your-key>", env)),
            vec![
                "Add it to your shell profile, or set `api_key` under [remote] in relay.toml"
                    .to_string(),
            ],
        ));
    }

    SetupOption {
        family: BackendFamily::Remote,
        title: "Remote API (full features)".to_string(),
        description: "Asynchronous sessions with large context and plan approval".to_string(),
        reason,
        pros: vec![
            "Asynchronous execution".to_string(),
            "100k+ lines of context".to_string(),
            "Plan approval workflow".to_string(),
        ],
        cons: vec![
            "Requires an API key".to_string(),
            format!("Repository must be connected at {}", REGISTRATION_URL),
        ],
        steps: numbered(steps),
    }
}

fn recommend(
    report: &AvailabilityReport,
    options: &[SetupOption],
    hints: &SetupHints,
) -> (Option<BackendFamily>, Option<String>) {
    let local = report.family(BackendFamily::Local);
    let local_needs_login_only = local.is_some_and(|a: &BackendAvailability| {
        !a.available && a.details.binary_installed == Some(true)
    });

    if local_needs_login_only {
        return (
            Some(BackendFamily::Local),
            Some(format!(
                "Just log in ({} login), then you are ready to go",
                hints.binary
            )),
        );
    }
    match options {
        [] => (None, None),
        [only] => (
            Some(only.family),
            Some("Only remaining backend to configure".to_string()),
        ),
        [first, ..] => (
            Some(first.family),
            Some("Simplest setup; you can add the other backend later".to_string()),
        ),
    }
}
