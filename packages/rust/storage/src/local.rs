//! Directory-backed document store used in local mode.

use std::path::{Path, PathBuf};

use apidash_shared::{ApidashError, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::DocumentStore;

/// Reads and writes documents under a local directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn load_document(&self, path: &str) -> Result<serde_json::Value> {
        let file = self.resolve(path);
        debug!(file = %file.display(), "loading local document");

        let content = match tokio::fs::read_to_string(&file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApidashError::NotFound(file.display().to_string()));
            }
            Err(e) => return Err(ApidashError::io(&file, e)),
        };

        serde_json::from_str(&content)
            .map_err(|e| ApidashError::decode(format!("{}: invalid JSON: {e}", file.display())))
    }

    #[instrument(skip(self, document), fields(root = %self.root.display()))]
    async fn save_document(&self, path: &str, document: &serde_json::Value) -> Result<()> {
        let file = self.resolve(path);
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApidashError::io(parent, e))?;
        }

        let mut content = serde_json::to_string_pretty(document)
            .map_err(|e| ApidashError::decode(format!("{path}: {e}")))?;
        content.push('\n');

        tokio::fs::write(&file, content)
            .await
            .map_err(|e| ApidashError::io(&file, e))?;
        info!(file = %file.display(), "document written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local {}", self.root.display())
    }
}
