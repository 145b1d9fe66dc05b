//! Application configuration for apidash.
//!
//! User config lives at `~/.apidash/apidash.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ApidashError, Result};
use crate::types::RepoRef;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "apidash.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".apidash";

// ---------------------------------------------------------------------------
// Config structs (matching apidash.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the backing repository lives and how to recognize it.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Document locations.
    #[serde(default)]
    pub content: ContentConfig,

    /// Change-request submission.
    #[serde(default)]
    pub submit: SubmitConfig,
}

/// `[repository]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Static-pages domain; hosts look like `<owner>.<pages_domain>`.
    #[serde(default = "default_pages_domain")]
    pub pages_domain: String,

    /// Base URL of the hosting platform's REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Published dashboard URL used to derive the repository context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,

    /// Fallback owner when nothing can be derived from the page URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_owner: Option<String>,

    /// Fallback repository name, paired with `default_owner`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_repo: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            pages_domain: default_pages_domain(),
            api_base: default_api_base(),
            page_url: None,
            default_owner: None,
            default_repo: None,
        }
    }
}

impl RepositoryConfig {
    /// The configured fallback pair, only when both halves are set.
    pub fn default_repo_ref(&self) -> Option<RepoRef> {
        match (&self.default_owner, &self.default_repo) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
                Some(RepoRef::new(owner, repo))
            }
            _ => None,
        }
    }
}

fn default_pages_domain() -> String {
    "github.io".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}

/// `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Path of the valid-values document, relative to the content root.
    #[serde(default = "default_valid_values_path")]
    pub valid_values_path: String,

    /// Directory prefix prepended to every path in the remote repository.
    #[serde(default = "default_remote_prefix")]
    pub remote_prefix: String,

    /// Local directory holding the documents in local mode.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,

    /// HTTP timeout for remote reads and submissions.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            valid_values_path: default_valid_values_path(),
            remote_prefix: default_remote_prefix(),
            local_dir: default_local_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_valid_values_path() -> String {
    "valid-platform-values.json".into()
}
fn default_remote_prefix() -> String {
    "docs/".into()
}
fn default_local_dir() -> String {
    "docs".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// Which external endpoint receives change requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Open an issue describing the change.
    #[default]
    Issue,
    /// Fire a repository-dispatch event for a workflow to act on.
    Dispatch,
}

/// `[submit]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    #[serde(default)]
    pub sink: SinkKind,

    /// Name of the env var holding the platform token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Labels attached to issue-based change requests.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// `event_type` for dispatch-based change requests.
    #[serde(default = "default_event_type")]
    pub event_type: String,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            token_env: default_token_env(),
            labels: default_labels(),
            event_type: default_event_type(),
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_labels() -> Vec<String> {
    vec!["catalog-change".into()]
}
fn default_event_type() -> String {
    "catalog-change".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.apidash/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ApidashError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.apidash/apidash.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ApidashError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ApidashError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ApidashError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ApidashError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ApidashError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the platform token from the configured env var.
pub fn validate_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.submit.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ApidashError::config(format!(
            "platform token not found. Set the {var_name} environment variable \
             to a token with issue or workflow access on the catalog repository."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("pages_domain"));
        assert!(toml_str.contains("GITHUB_TOKEN"));
        assert!(!toml_str.contains("default_owner"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.content.timeout_secs, 10);
        assert_eq!(parsed.submit.sink, SinkKind::Issue);
        assert_eq!(parsed.content.remote_prefix, "docs/");
    }

    #[test]
    fn config_with_default_repository() {
        let toml_str = r#"
[repository]
default_owner = "octo"
default_repo = "api-catalog"

[submit]
sink = "dispatch"
event_type = "catalog-edit"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(
            config.repository.default_repo_ref(),
            Some(RepoRef::new("octo", "api-catalog"))
        );
        assert_eq!(config.repository.pages_domain, "github.io");
        assert_eq!(config.submit.sink, SinkKind::Dispatch);
        assert_eq!(config.submit.labels, vec!["catalog-change"]);
    }

    #[test]
    fn half_configured_default_is_ignored() {
        let mut config = AppConfig::default();
        config.repository.default_owner = Some("octo".into());
        assert_eq!(config.repository.default_repo_ref(), None);
    }

    #[test]
    fn token_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.submit.token_env = "APIDASH_TEST_NONEXISTENT_TOKEN_12345".into();
        let result = validate_token(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("token not found"));
    }
}
