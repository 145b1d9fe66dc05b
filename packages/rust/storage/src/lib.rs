//! JSON document store for the API catalog.
//!
//! The [`DocumentStore`] trait has two implementations, picked once at
//! startup from the repository context:
//! - [`RemoteStore`]: reads through the hosting platform's content API
//! - [`LocalStore`]: reads and writes a local directory (no repository resolved)
//!
//! On top of the trait sit the catalog loaders for the valid-values document
//! and the per-team API documents.

mod local;
mod remote;

use apidash_shared::{
    ApidashError, AppConfig, RepoRef, Result, TeamApiDocument, ValidValues, team_api_filename,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

pub use local::LocalStore;
pub use remote::RemoteStore;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A place JSON documents are read from (and, for local stores, written to).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load and parse the document at `path`.
    ///
    /// Fails with `NotFound` when the document is absent and `Decode` when
    /// its payload is malformed.
    async fn load_document(&self, path: &str) -> Result<serde_json::Value>;

    /// Write `document` to `path`.
    async fn save_document(&self, path: &str, document: &serde_json::Value) -> Result<()>;

    /// Human-readable description for logs and status lines.
    fn describe(&self) -> String;
}

/// Pick the store implementation for a resolved (or absent) repository.
pub fn select_store(
    repo: Option<RepoRef>,
    config: &AppConfig,
    client: Client,
    token: Option<String>,
) -> Box<dyn DocumentStore> {
    match repo {
        Some(repo) => {
            info!(%repo, "using remote content store");
            Box::new(
                RemoteStore::new(client, config.repository.api_base.clone(), repo)
                    .with_prefix(config.content.remote_prefix.clone())
                    .with_token(token),
            )
        }
        None => {
            info!(dir = %config.content.local_dir, "using local content store");
            Box::new(LocalStore::new(config.content.local_dir.clone()))
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog loaders
// ---------------------------------------------------------------------------

/// Load `path` and decode it into `T`.
pub async fn load_typed<T: DeserializeOwned>(store: &dyn DocumentStore, path: &str) -> Result<T> {
    let value = store.load_document(path).await?;
    serde_json::from_value(value)
        .map_err(|e| ApidashError::decode(format!("{path}: unexpected document shape: {e}")))
}

/// Load the shared valid-values document.
#[instrument(skip(store), fields(backend = %store.describe()))]
pub async fn load_valid_values(store: &dyn DocumentStore, path: &str) -> Result<ValidValues> {
    load_typed(store, path).await
}

/// Load one team's API document, substituting an empty document when the
/// file does not exist yet.
pub async fn load_team_api_document(
    store: &dyn DocumentStore,
    team_name: &str,
) -> Result<TeamApiDocument> {
    let file_name = team_api_filename(team_name);
    match load_typed::<TeamApiDocument>(store, &file_name).await {
        Ok(mut document) => {
            if document.team_name != team_name {
                warn!(
                    team = team_name,
                    file = %file_name,
                    recorded = %document.team_name,
                    "team document names a different team; using the requested name"
                );
                document.team_name = team_name.to_string();
            }
            Ok(document)
        }
        Err(e) if e.is_not_found() => {
            warn!(team = team_name, file = %file_name, "no API document for team, starting empty");
            Ok(TeamApiDocument::empty(team_name))
        }
        Err(e) => Err(e),
    }
}

/// Load every team's API document, serially and in the given order.
///
/// A missing document is a team with no APIs yet; any other failure aborts
/// the whole load. `on_loaded` sees each document with its 1-based position.
#[instrument(skip_all, fields(backend = %store.describe(), teams = team_names.len()))]
pub async fn load_team_api_documents(
    store: &dyn DocumentStore,
    team_names: &[String],
    mut on_loaded: impl FnMut(&TeamApiDocument, usize, usize) + Send,
) -> Result<Vec<TeamApiDocument>> {
    let total = team_names.len();
    let mut documents = Vec::with_capacity(total);
    for (i, team_name) in team_names.iter().enumerate() {
        let document = load_team_api_document(store, team_name).await?;
        on_loaded(&document, i + 1, total);
        documents.push(document);
    }
    info!(documents = documents.len(), "team API documents loaded");
    Ok(documents)
}
