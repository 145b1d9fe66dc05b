//! Change requests: how edits leave the process.
//!
//! The remote store is never written directly. Each accepted edit becomes a
//! [`ChangeRequest`] handed to a [`ChangeSink`] (an issue or a dispatch
//! event), and something outside this process applies it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use apidash_shared::{ApidashError, AppConfig, RepoRef, Result, SinkKind};

const ACCEPT: &str = "application/vnd.github+json";

// ---------------------------------------------------------------------------
// Request model
// ---------------------------------------------------------------------------

/// Kind of change carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeAction {
    AddTeam,
    DeleteTeam,
    UpdateApi,
    DeleteApi,
    AssignApiToTeam,
    AddValidValue,
    RemoveValidValue,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddTeam => "add-team",
            Self::DeleteTeam => "delete-team",
            Self::UpdateApi => "update-api",
            Self::DeleteApi => "delete-api",
            Self::AssignApiToTeam => "assign-api-to-team",
            Self::AddValidValue => "add-valid-value",
            Self::RemoveValidValue => "remove-valid-value",
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edit packaged for an external sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub id: Uuid,
    pub action: ChangeAction,
    pub payload: serde_json::Value,
    pub requested_at: DateTime<Utc>,
}

impl ChangeRequest {
    pub fn new(action: ChangeAction, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            action,
            payload,
            requested_at: Utc::now(),
        }
    }

    /// What the payload is about: an asset id, team name or list value.
    fn subject(&self) -> Option<&str> {
        ["assetId", "name", "teamName", "value"]
            .iter()
            .find_map(|key| self.payload.get(key).and_then(|v| v.as_str()))
    }

    pub fn title(&self) -> String {
        match self.subject() {
            Some(subject) => format!("[catalog] {}: {subject}", self.action),
            None => format!("[catalog] {}", self.action),
        }
    }

    /// Markdown body: action, id, timestamp and the pretty-printed payload.
    pub fn body(&self) -> String {
        let payload = serde_json::to_string_pretty(&self.payload)
            .unwrap_or_else(|_| self.payload.to_string());
        format!(
            "**Action:** `{}`\n**Request ID:** `{}`\n**Requested at:** {}\n\n```json\n{}\n```\n",
            self.action,
            self.id,
            self.requested_at.to_rfc3339(),
            payload
        )
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// An external endpoint that accepts change requests.
#[async_trait]
pub trait ChangeSink: Send + Sync {
    /// Deliver `request`. Returns a link to the created artifact when the
    /// endpoint provides one.
    async fn send(&self, repo: &RepoRef, request: &ChangeRequest) -> Result<Option<String>>;

    fn name(&self) -> &'static str;
}

/// Shared HTTP plumbing for the platform sinks.
#[derive(Clone)]
struct PlatformApi {
    client: Client,
    api_base: String,
    token: Option<String>,
    token_env: String,
}

impl PlatformApi {
    fn new(client: Client, config: &AppConfig, token: Option<String>) -> Self {
        Self {
            client,
            api_base: config.repository.api_base.trim_end_matches('/').to_string(),
            token,
            token_env: config.submit.token_env.clone(),
        }
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let token = self.token.as_deref().ok_or_else(|| {
            ApidashError::config(format!(
                "set {} to submit change requests",
                self.token_env
            ))
        })?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| ApidashError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApidashError::Network(format!(
                "{url}: HTTP {status}: {}",
                detail.trim()
            )));
        }
        Ok(response)
    }
}

/// Opens an issue per change request.
pub struct IssueSink {
    api: PlatformApi,
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct CreatedIssue {
    html_url: Option<String>,
}

impl IssueSink {
    pub fn new(client: Client, config: &AppConfig, token: Option<String>) -> Self {
        Self {
            api: PlatformApi::new(client, config, token),
            labels: config.submit.labels.clone(),
        }
    }
}

#[async_trait]
impl ChangeSink for IssueSink {
    #[instrument(skip_all, fields(%repo, action = %request.action))]
    async fn send(&self, repo: &RepoRef, request: &ChangeRequest) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/{}/issues", self.api.api_base, repo.owner, repo.repo);
        let body = serde_json::json!({
            "title": request.title(),
            "body": request.body(),
            "labels": self.labels,
        });

        let response = self.api.post(&url, &body).await?;
        let created: CreatedIssue = response
            .json()
            .await
            .map_err(|e| ApidashError::decode(format!("{url}: unexpected issue response: {e}")))?;
        Ok(created.html_url)
    }

    fn name(&self) -> &'static str {
        "issue"
    }
}

/// Fires a repository-dispatch event per change request.
pub struct DispatchSink {
    api: PlatformApi,
    event_type: String,
}

impl DispatchSink {
    pub fn new(client: Client, config: &AppConfig, token: Option<String>) -> Self {
        Self {
            api: PlatformApi::new(client, config, token),
            event_type: config.submit.event_type.clone(),
        }
    }
}

#[async_trait]
impl ChangeSink for DispatchSink {
    #[instrument(skip_all, fields(%repo, action = %request.action))]
    async fn send(&self, repo: &RepoRef, request: &ChangeRequest) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/dispatches",
            self.api.api_base, repo.owner, repo.repo
        );
        let body = serde_json::json!({
            "event_type": self.event_type,
            "client_payload": {
                "action": request.action,
                "requestId": request.id,
                "payload": request.payload,
            },
        });

        self.api.post(&url, &body).await?;
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "dispatch"
    }
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

/// Result of [`ChangeSubmitter::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// No repository context; the edit stays local.
    Skipped,
    /// The sink queued the request. The catalog is stale until a reload.
    Accepted {
        request: ChangeRequest,
        url: Option<String>,
    },
}

/// Routes edits to the configured sink for the resolved repository.
pub struct ChangeSubmitter {
    target: Option<(RepoRef, Box<dyn ChangeSink>)>,
}

impl ChangeSubmitter {
    pub fn new(repo: RepoRef, sink: Box<dyn ChangeSink>) -> Self {
        Self {
            target: Some((repo, sink)),
        }
    }

    /// A submitter that skips every request (local mode).
    pub fn disabled() -> Self {
        Self { target: None }
    }

    /// Build the sink named in `[submit]` for `repo`, or a disabled submitter
    /// when no repository was resolved.
    pub fn from_config(
        repo: Option<RepoRef>,
        config: &AppConfig,
        client: Client,
        token: Option<String>,
    ) -> Self {
        let Some(repo) = repo else {
            return Self::disabled();
        };
        let sink: Box<dyn ChangeSink> = match config.submit.sink {
            SinkKind::Issue => Box::new(IssueSink::new(client, config, token)),
            SinkKind::Dispatch => Box::new(DispatchSink::new(client, config, token)),
        };
        Self::new(repo, sink)
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Name of the active sink, if any.
    pub fn sink_name(&self) -> Option<&'static str> {
        self.target.as_ref().map(|(_, sink)| sink.name())
    }

    pub async fn submit(
        &self,
        action: ChangeAction,
        payload: serde_json::Value,
    ) -> Result<SubmitOutcome> {
        let Some((repo, sink)) = &self.target else {
            info!(%action, "no repository context, change kept local");
            return Ok(SubmitOutcome::Skipped);
        };

        let request = ChangeRequest::new(action, payload);
        let url = sink.send(repo, &request).await?;
        info!(
            %action,
            request_id = %request.id,
            sink = sink.name(),
            url = url.as_deref().unwrap_or("-"),
            "change request submitted"
        );
        Ok(SubmitOutcome::Accepted { request, url })
    }
}
