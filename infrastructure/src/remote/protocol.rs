//! Wire types for the remote session API (JSON, camelCase).

use chrono::{DateTime, Utc};
use regex::Regex;
use relay_application::{RemoteSessionInfo, RemoteSource};
use relay_domain::{Activity, ActivityKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

static PATCH_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\+\+\+ b/(\S+)").expect("valid regex"));

// ==================== Sources ====================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSourcesResponse {
    #[serde(default)]
    pub sources: Vec<ApiSource>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSource {
    pub name: String,
    #[serde(default)]
    pub id: String,
    pub github_repo: Option<ApiGithubRepo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGithubRepo {
    pub owner: String,
    pub repo: String,
}

impl From<ApiSource> for RemoteSource {
    fn from(source: ApiSource) -> Self {
        let id = if source.id.is_empty() {
            source
                .name
                .strip_prefix("sources/")
                .unwrap_or(&source.name)
                .to_string()
        } else {
            source.id
        };
        let remote = RemoteSource::new(source.name, id);
        match source.github_repo {
            Some(repo) => remote.with_repository(repo.owner, repo.repo),
            None => remote,
        }
    }
}

// ==================== Sessions ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub prompt: String,
    pub source_context: SourceContext,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub require_plan_approval: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContext {
    pub source: String,
    pub github_repo_context: GithubRepoContext,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubRepoContext {
    pub starting_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSession {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: String,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl From<ApiSession> for RemoteSessionInfo {
    fn from(session: ApiSession) -> Self {
        let id = if session.id.is_empty() {
            session
                .name
                .strip_prefix("sessions/")
                .unwrap_or(&session.name)
                .to_string()
        } else {
            session.id
        };
        RemoteSessionInfo {
            id,
            state: session.state,
            url: session.url,
            title: session.title,
        }
    }
}

// ==================== Activities ====================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActivitiesResponse {
    #[serde(default)]
    pub activities: Vec<ApiActivity>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiActivity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub originator: String,
    pub create_time: Option<DateTime<Utc>>,
    pub plan_generated: Option<PlanGenerated>,
    pub agent_messaged: Option<AgentMessaged>,
    pub code_change_made: Option<CodeChangeMade>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanGenerated {
    #[serde(default)]
    pub plan: Plan,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanStep {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessaged {
    #[serde(default)]
    pub agent_message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeChangeMade {
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub change_set: Option<ChangeSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub git_patch: Option<GitPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPatch {
    #[serde(default)]
    pub unidiff_patch: String,
}

impl ApiActivity {
    /// Paths named by the activity, from an explicit file list or from patch headers.
    fn changed_files(&self) -> Vec<PathBuf> {
        let mut files: BTreeSet<PathBuf> = self
            .code_change_made
            .iter()
            .flat_map(|change| change.files.iter().map(PathBuf::from))
            .collect();
        for patch in self
            .artifacts
            .iter()
            .filter_map(|a| a.change_set.as_ref()?.git_patch.as_ref())
        {
            files.extend(
                PATCH_TARGET
                    .captures_iter(&patch.unidiff_patch)
                    .map(|c| PathBuf::from(&c[1])),
            );
        }
        files.into_iter().collect()
    }
}

impl From<ApiActivity> for Activity {
    fn from(activity: ApiActivity) -> Self {
        let files = activity.changed_files();
        let kind = if let Some(plan) = &activity.plan_generated {
            ActivityKind::PlanGenerated {
                steps: plan.plan.steps.iter().map(|s| s.title.clone()).collect(),
            }
        } else if !files.is_empty() {
            ActivityKind::CodeChange { files }
        } else if let Some(message) = &activity.agent_messaged {
            ActivityKind::AgentMessage {
                message: message.agent_message.clone(),
            }
        } else {
            ActivityKind::Other
        };

        let id = if activity.id.is_empty() {
            activity
                .name
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            activity.id
        };

        let mut converted = Activity::new(id, activity.description, kind);
        if !activity.originator.is_empty() {
            converted = converted.with_originator(activity.originator);
        }
        if let Some(time) = activity.create_time {
            converted = converted.with_create_time(time);
        }
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_conversion() {
        let response: ListSourcesResponse = serde_json::from_str(
            r#"{"sources":[{"name":"sources/github/acme/api","githubRepo":{"owner":"acme","repo":"api"}}]}"#,
        )
        .unwrap();
        let source = RemoteSource::from(response.sources[0].clone());
        assert_eq!(source.id, "github/acme/api");
        assert_eq!(source.full_name().as_deref(), Some("acme/api"));
    }

    #[test]
    fn test_create_request_shape() {
        let request = CreateSessionRequest {
            prompt: "add tests".to_string(),
            source_context: SourceContext {
                source: "sources/github/acme/api".to_string(),
                github_repo_context: GithubRepoContext {
                    starting_branch: "main".to_string(),
                },
            },
            require_plan_approval: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["sourceContext"]["githubRepoContext"]["startingBranch"], "main");
        assert!(value.get("requirePlanApproval").is_none());
    }

    #[test]
    fn test_session_id_from_name() {
        let session: ApiSession =
            serde_json::from_str(r#"{"name":"sessions/31415","state":"IN_PROGRESS"}"#).unwrap();
        let info = RemoteSessionInfo::from(session);
        assert_eq!(info.id, "31415");
        assert_eq!(info.state, "IN_PROGRESS");
    }

    #[test]
    fn test_activity_kinds() {
        let response: ListActivitiesResponse = serde_json::from_str(
            r#"{"activities":[
                {"name":"sessions/1/activities/a1","description":"Plan","originator":"agent",
                 "createTime":"2025-01-01T10:00:00Z",
                 "planGenerated":{"plan":{"steps":[{"title":"Read code"},{"title":"Fix bug"}]}}},
                {"id":"a2","description":"Patch","originator":"agent",
                 "createTime":"2025-01-01T10:05:00Z",
                 "artifacts":[{"changeSet":{"gitPatch":{"unidiffPatch":"--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1 @@\n"}}}]},
                {"id":"a3","description":"Done","agentMessaged":{"agentMessage":"All set"}}
            ]}"#,
        )
        .unwrap();
        let activities: Vec<Activity> = response.activities.into_iter().map(Activity::from).collect();

        assert_eq!(activities[0].id, "a1");
        assert!(matches!(
            &activities[0].kind,
            ActivityKind::PlanGenerated { steps } if steps.len() == 2
        ));
        assert_eq!(activities[1].changed_files(), &[PathBuf::from("src/lib.rs")]);
        assert!(matches!(
            &activities[2].kind,
            ActivityKind::AgentMessage { message } if message == "All set"
        ));
        assert!(activities[2].create_time.is_none());
    }
}
