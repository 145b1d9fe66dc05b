//! Application context shared by the front ends.
//!
//! [`AppContext`] is built once at startup and passed explicitly. It owns the
//! catalog and is the only place edits are applied: validation, the local
//! write-back and change-request submission all happen in [`AppContext::apply`].

use serde::Serialize;
use tracing::{info, instrument, warn};

use apidash_discovery::{Resolution, build_client};
use apidash_shared::{ApidashError, AppConfig, Result, validate_token};
use apidash_storage::{DocumentStore, select_store};

use crate::catalog::{Catalog, UpsertOutcome};
use crate::load::{LoadReporter, load_catalog};
use crate::submit::{ChangeRequest, ChangeSubmitter, SubmitOutcome};
use crate::view::{EditIntent, Notification, ViewState};

/// A backing document changed by an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Touched {
    ValidValues,
    Team(String),
}

/// A committed catalog mutation, ready to persist and submit.
struct Applied {
    summary: String,
    payload: serde_json::Value,
    touched: Vec<Touched>,
}

fn to_payload<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| ApidashError::decode(format!("failed to encode change payload: {e}")))
}

pub struct AppContext {
    config: AppConfig,
    resolution: Resolution,
    store: Box<dyn DocumentStore>,
    catalog: Catalog,
    submitter: ChangeSubmitter,
    /// Search and filter state of the API table.
    pub view: ViewState,
    pending: Vec<ChangeRequest>,
    persist_local: bool,
}

impl AppContext {
    /// Pick the store and sink for `resolution`, then load the catalog.
    ///
    /// The token is only looked up when a repository is resolved; a missing
    /// token is not fatal here since public repositories read anonymously.
    #[instrument(skip_all, fields(source = %resolution.source))]
    pub async fn bootstrap(
        config: AppConfig,
        resolution: Resolution,
        reporter: &dyn LoadReporter,
    ) -> Result<Self> {
        let client = build_client(config.content.timeout_secs)?;
        let token = if resolution.is_remote() {
            validate_token(&config)
                .inspect_err(|e| warn!(error = %e, "continuing without a platform token"))
                .ok()
        } else {
            None
        };

        let store = select_store(resolution.repo.clone(), &config, client.clone(), token.clone());
        let submitter =
            ChangeSubmitter::from_config(resolution.repo.clone(), &config, client, token);
        Self::with_parts(config, resolution, store, submitter, reporter).await
    }

    /// Load the catalog from an already chosen store and submitter.
    pub async fn with_parts(
        config: AppConfig,
        resolution: Resolution,
        store: Box<dyn DocumentStore>,
        submitter: ChangeSubmitter,
        reporter: &dyn LoadReporter,
    ) -> Result<Self> {
        let catalog =
            load_catalog(store.as_ref(), &config.content.valid_values_path, reporter).await?;
        Ok(Self {
            config,
            resolution,
            store,
            catalog,
            submitter,
            view: ViewState::default(),
            pending: Vec::new(),
            persist_local: false,
        })
    }

    /// Write touched documents back to the local store after each edit.
    /// Has no effect when a repository is resolved.
    pub fn set_persist_local(&mut self, persist: bool) {
        self.persist_local = persist;
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    pub fn submitter(&self) -> &ChangeSubmitter {
        &self.submitter
    }

    /// Change requests submitted since the last load.
    pub fn pending_changes(&self) -> &[ChangeRequest] {
        &self.pending
    }

    /// Whether submitted changes may not be reflected in the store yet.
    pub fn is_stale(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn visible_apis(&self) -> Vec<&apidash_shared::ApiRecord> {
        self.view.visible_apis(&self.catalog)
    }

    /// Advance the API table's team filter to the next team.
    pub fn cycle_team_filter(&mut self) {
        self.view.cycle_team_filter(&self.catalog);
    }

    /// Rebuild the catalog from the store. On failure the current catalog
    /// is kept.
    pub async fn reload(&mut self, reporter: &dyn LoadReporter) -> Result<()> {
        let catalog = load_catalog(
            self.store.as_ref(),
            &self.config.content.valid_values_path,
            reporter,
        )
        .await?;
        self.catalog = catalog;
        self.pending.clear();
        self.view.retain_valid(&self.catalog);
        Ok(())
    }

    /// Apply one edit. Never fails: problems come back as notifications.
    #[instrument(skip_all, fields(action = %intent.action()))]
    pub async fn apply(&mut self, intent: EditIntent) -> Notification {
        let action = intent.action();
        let applied = match self.mutate(intent) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(error = %e, "edit rejected");
                return Notification::error(e.to_string());
            }
        };
        self.view.retain_valid(&self.catalog);
        info!(summary = %applied.summary, "edit applied");

        let persisted = self.persist_local && !self.resolution.is_remote();
        if persisted {
            if let Err(e) = self.persist(&applied.touched).await {
                warn!(error = %e, "local write-back failed");
                return Notification::warning(format!(
                    "{}, but writing the local documents failed: {e}",
                    applied.summary
                ));
            }
        }

        match self.submitter.submit(action, applied.payload).await {
            Ok(SubmitOutcome::Skipped) if persisted => Notification::success(format!(
                "{}; saved to {}",
                applied.summary,
                self.store.describe()
            )),
            Ok(SubmitOutcome::Skipped) => {
                Notification::success(format!("{} (local only)", applied.summary))
            }
            Ok(SubmitOutcome::Accepted { request, url }) => {
                self.pending.push(request);
                let link = url.map(|u| format!(": {u}")).unwrap_or_default();
                Notification::success(format!(
                    "{}; change request submitted{link}",
                    applied.summary
                ))
            }
            Err(e) => {
                warn!(error = %e, "change request failed");
                Notification::warning(format!(
                    "{}, but the change request failed: {e}. Changes are only local.",
                    applied.summary
                ))
            }
        }
    }

    fn mutate(&mut self, intent: EditIntent) -> Result<Applied> {
        let catalog = &mut self.catalog;
        match intent {
            EditIntent::UpsertApi(record) => {
                let asset_id = record.asset_id.clone();
                let team = record.team_name.clone();
                let outcome = catalog.upsert_api(record)?;
                let stored = catalog
                    .find_api(&asset_id)
                    .ok_or_else(|| ApidashError::NotFound(format!("API '{asset_id}'")))?;
                let summary = match outcome {
                    UpsertOutcome::Inserted => format!("Added API '{asset_id}' to '{team}'"),
                    UpsertOutcome::Updated => format!("Updated API '{asset_id}'"),
                };
                Ok(Applied {
                    summary,
                    payload: to_payload(stored)?,
                    touched: vec![Touched::Team(team)],
                })
            }
            EditIntent::ReassignApi { asset_id, new_team } => {
                let previous = catalog.owner_of(&asset_id).map(str::to_string);
                let moved = catalog.reassign_api(&asset_id, &new_team)?;
                let previous = previous.unwrap_or_default();
                Ok(Applied {
                    summary: format!("Moved API '{asset_id}' from '{previous}' to '{new_team}'"),
                    payload: serde_json::json!({
                        "assetId": asset_id,
                        "previousTeamName": previous,
                        "newTeamName": new_team,
                        "apiData": to_payload(&moved)?,
                    }),
                    // Destination first, so the API is never absent from both files.
                    touched: vec![Touched::Team(new_team), Touched::Team(previous)],
                })
            }
            EditIntent::DeleteApi { asset_id } => {
                let owner = catalog
                    .owner_of(&asset_id)
                    .map(str::to_string)
                    .ok_or_else(|| ApidashError::NotFound(format!("API '{asset_id}'")))?;
                let removed = catalog
                    .delete_api(&asset_id)
                    .ok_or_else(|| ApidashError::NotFound(format!("API '{asset_id}'")))?;
                Ok(Applied {
                    summary: format!("Deleted API '{asset_id}'"),
                    payload: serde_json::json!({
                        "assetId": asset_id,
                        "teamName": owner,
                        "apiData": to_payload(&removed)?,
                    }),
                    touched: vec![Touched::Team(owner)],
                })
            }
            EditIntent::AddTeam(team) => {
                let name = team.name.clone();
                let payload = to_payload(&team)?;
                catalog.add_team(team)?;
                Ok(Applied {
                    summary: format!("Added team '{name}'"),
                    payload,
                    touched: vec![Touched::ValidValues, Touched::Team(name)],
                })
            }
            EditIntent::DeleteTeam { name } => {
                catalog.delete_team(&name)?;
                Ok(Applied {
                    summary: format!("Deleted team '{name}'"),
                    payload: serde_json::json!({ "teamName": name }),
                    touched: vec![Touched::ValidValues],
                })
            }
            EditIntent::AddValidValue { list, value } => {
                catalog.add_valid_value(list, &value)?;
                Ok(Applied {
                    summary: format!("Added '{value}' to {list}"),
                    payload: serde_json::json!({ "list": list.document_key(), "value": value }),
                    touched: vec![Touched::ValidValues],
                })
            }
            EditIntent::RemoveValidValue { list, value } => {
                catalog.remove_valid_value(list, &value)?;
                Ok(Applied {
                    summary: format!("Removed '{value}' from {list}"),
                    payload: serde_json::json!({ "list": list.document_key(), "value": value }),
                    touched: vec![Touched::ValidValues],
                })
            }
        }
    }

    /// Write the touched documents back through the store.
    async fn persist(&self, touched: &[Touched]) -> Result<()> {
        for item in touched {
            match item {
                Touched::ValidValues => {
                    let document = to_payload(&self.catalog.valid_values())?;
                    self.store
                        .save_document(&self.config.content.valid_values_path, &document)
                        .await?;
                }
                Touched::Team(name) => {
                    let Some(document) = self.catalog.document(name) else {
                        continue;
                    };
                    self.store
                        .save_document(&document.file_name(), &to_payload(document)?)
                        .await?;
                }
            }
        }
        Ok(())
    }
}
