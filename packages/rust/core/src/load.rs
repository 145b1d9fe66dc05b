//! Catalog load: valid values → per-team documents → merged [`Catalog`].

use std::time::{Duration, Instant};

use tracing::{info, instrument};

use apidash_shared::Result;
use apidash_storage::{DocumentStore, load_team_api_documents, load_valid_values};

use crate::catalog::Catalog;

/// What a finished load produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Store description, e.g. `remote octo/api-catalog:docs/`.
    pub source: String,
    pub teams: usize,
    pub apis: usize,
    pub elapsed: Duration,
}

/// Progress callback for catalog loads.
pub trait LoadReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each per-team document is read.
    fn document_loaded(&self, file_name: &str, current: usize, total: usize);
    /// Called when the catalog is assembled.
    fn done(&self, summary: &LoadSummary);
}

/// No-op reporter for headless/test usage.
pub struct SilentReporter;

impl LoadReporter for SilentReporter {
    fn phase(&self, _name: &str) {}
    fn document_loaded(&self, _file_name: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &LoadSummary) {}
}

/// Load every backing document from `store` and merge them.
///
/// 1. Valid values (teams, CMDB groups, business groups)
/// 2. One API document per team, serially in team order
/// 3. Merge into a [`Catalog`]
///
/// A missing team document becomes an empty one; anything else that fails
/// aborts the load so no partial catalog is ever returned.
#[instrument(skip_all, fields(backend = %store.describe()))]
pub async fn load_catalog(
    store: &dyn DocumentStore,
    valid_values_path: &str,
    reporter: &dyn LoadReporter,
) -> Result<Catalog> {
    let start = Instant::now();

    reporter.phase("Loading valid values");
    let valid = load_valid_values(store, valid_values_path).await?;
    let team_names = valid.team_names();

    reporter.phase("Loading team API documents");
    let documents = load_team_api_documents(store, &team_names, |document, current, total| {
        reporter.document_loaded(&document.file_name(), current, total)
    })
    .await?;

    let catalog = Catalog::new(valid, documents);
    let summary = LoadSummary {
        source: store.describe(),
        teams: catalog.teams().len(),
        apis: catalog.api_count(),
        elapsed: start.elapsed(),
    };
    info!(
        teams = summary.teams,
        apis = summary.apis,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "catalog loaded"
    );
    reporter.done(&summary);

    Ok(catalog)
}
