//! Shared types, error model, and configuration for apidash.
//!
//! This crate is the foundation depended on by all other apidash crates.
//! It provides:
//! - [`ApidashError`]: the unified error type
//! - Catalog document types ([`ValidValues`], [`Team`], [`ApiRecord`], [`TeamApiDocument`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ContentConfig, RepositoryConfig, SinkKind, SubmitConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_token,
};
pub use error::{ApidashError, Result};
pub use types::{
    ApiRecord, RepoRef, TEAM_API_FILE_SUFFIX, Team, TeamApiDocument, TeamEntry, ValidValues,
    ValueList, team_api_filename,
};
