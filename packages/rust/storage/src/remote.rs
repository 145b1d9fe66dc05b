//! Content-API backed document store.

use apidash_shared::{ApidashError, RepoRef, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::DocumentStore;

/// Envelope returned by `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Reads documents through the hosting platform's content API.
///
/// Writes are refused: remote changes only travel as change requests.
pub struct RemoteStore {
    client: Client,
    api_base: String,
    repo: RepoRef,
    prefix: String,
    token: Option<String>,
}

impl RemoteStore {
    pub fn new(client: Client, api_base: impl Into<String>, repo: RepoRef) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            repo,
            prefix: String::new(),
            token: None,
        }
    }

    /// Directory prefix prepended to every requested path (e.g. `docs/`).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Bearer token for private repositories.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn full_path(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    /// `{api_base}/repos/{owner}/{repo}/contents/{path}` with every segment
    /// percent-encoded, so `#`, `?` and `%` in team names stay in the path.
    fn contents_url(&self, full_path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| {
            ApidashError::config(format!("invalid api_base '{}': {e}", self.api_base))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ApidashError::config(format!("api_base '{}' cannot take a path", self.api_base))
            })?
            .pop_if_empty()
            .extend(["repos", self.repo.owner.as_str(), self.repo.repo.as_str(), "contents"])
            .extend(full_path.split('/'));
        Ok(url)
    }
}

/// Decode a content-API envelope body into JSON.
pub(crate) fn decode_envelope(full_path: &str, body: &str) -> Result<serde_json::Value> {
    let envelope: ContentEnvelope = serde_json::from_str(body)
        .map_err(|e| ApidashError::decode(format!("{full_path}: malformed content envelope: {e}")))?;

    if let Some(encoding) = envelope.encoding.as_deref() {
        if encoding != "base64" {
            return Err(ApidashError::decode(format!(
                "{full_path}: unsupported content encoding '{encoding}'"
            )));
        }
    }

    // The API wraps base64 payloads at 60 columns.
    let compact: String = envelope
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ApidashError::decode(format!("{full_path}: invalid base64: {e}")))?;

    let text = String::from_utf8(bytes)
        .map_err(|e| ApidashError::decode(format!("{full_path}: payload is not UTF-8: {e}")))?;

    serde_json::from_str(&text)
        .map_err(|e| ApidashError::decode(format!("{full_path}: invalid JSON: {e}")))
}

#[async_trait]
impl DocumentStore for RemoteStore {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn load_document(&self, path: &str) -> Result<serde_json::Value> {
        let full_path = self.full_path(path);
        let url = self.contents_url(&full_path)?;
        debug!(%url, "loading document from content API");

        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApidashError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApidashError::NotFound(format!("{full_path} (HTTP {status})")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApidashError::Network(format!("{url}: failed to read body: {e}")))?;

        decode_envelope(&full_path, &body)
    }

    async fn save_document(&self, path: &str, _document: &serde_json::Value) -> Result<()> {
        Err(ApidashError::ReadOnly(format!(
            "{} in {} is only changed through change requests",
            self.full_path(path),
            self.repo
        )))
    }

    fn describe(&self) -> String {
        format!("remote {}:{}", self.repo, self.prefix)
    }
}
