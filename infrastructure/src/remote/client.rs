//! HTTP adapter for the remote session API.
//!
//! Every request carries the API key in the `X-Goog-Api-Key` header. List
//! endpoints are paginated with `pageToken`/`nextPageToken`.

use super::error::RemoteApiError;
use super::protocol::{
    ApiSession, CreateSessionRequest, GithubRepoContext, ListActivitiesResponse,
    ListSourcesResponse, SourceContext,
};
use async_trait::async_trait;
use relay_application::{
    BackendError, NewRemoteSession, RemoteSessionBackend, RemoteSessionInfo, RemoteSource,
};
use relay_domain::Activity;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const USER_AGENT: &str = concat!("agent-relay/", env!("CARGO_PKG_VERSION"));
/// Upper bound on pages fetched for one listing.
const MAX_PAGES: usize = 50;

/// Remote session API over HTTPS.
pub struct HttpRemoteBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpRemoteBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RemoteApiError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RemoteApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        // Empty bodies (approve, cancel) decode as `{}`.
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| RemoteApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        page_token: Option<&str>,
    ) -> Result<T, RemoteApiError> {
        let mut request = self.request(Method::GET, path);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        self.send(request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteApiError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }
}

#[async_trait]
impl RemoteSessionBackend for HttpRemoteBackend {
    async fn list_sources(&self) -> Result<Vec<RemoteSource>, BackendError> {
        let mut sources = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let page: ListSourcesResponse = self.get("sources", page_token.as_deref()).await?;
            sources.extend(page.sources.into_iter().map(RemoteSource::from));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(count = sources.len(), "Listed remote sources");
        Ok(sources)
    }

    async fn create_session(
        &self,
        request: &NewRemoteSession,
    ) -> Result<RemoteSessionInfo, BackendError> {
        let body = CreateSessionRequest {
            prompt: request.prompt.clone(),
            source_context: SourceContext {
                source: request.source.clone(),
                github_repo_context: GithubRepoContext {
                    starting_branch: request.branch.clone(),
                },
            },
            require_plan_approval: request.require_plan_approval,
        };
        let session: ApiSession = self.post("sessions", &body).await?;
        Ok(session.into())
    }

    async fn get_session(&self, id: &str) -> Result<RemoteSessionInfo, BackendError> {
        let session: ApiSession = self.get(&format!("sessions/{}", id), None).await?;
        Ok(session.into())
    }

    async fn list_activities(&self, id: &str) -> Result<Vec<Activity>, BackendError> {
        let path = format!("sessions/{}/activities", id);
        let mut activities = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let page: ListActivitiesResponse = self.get(&path, page_token.as_deref()).await?;
            activities.extend(page.activities.into_iter().map(Activity::from));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(activities)
    }

    async fn approve_plan(&self, id: &str) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .post(&format!("sessions/{}:approvePlan", id), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn cancel(&self, id: &str) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .send(self.request(Method::DELETE, &format!("sessions/{}", id)))
            .await?;
        Ok(())
    }
}
