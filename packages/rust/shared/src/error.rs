//! Error types for apidash.
//!
//! Library crates use [`ApidashError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all apidash operations.
#[derive(Debug, thiserror::Error)]
pub enum ApidashError {
    /// A document or record is absent. Loaders often recover from this by
    /// substituting an empty default.
    #[error("not found: {0}")]
    NotFound(String),

    /// A payload could not be decoded (base64, UTF-8, or JSON).
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A caller-supplied record violates a catalog invariant.
    #[error("validation error on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// The operation would break a relational invariant.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation requested no actual change.
    #[error("no change: {0}")]
    NoOp(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to the hosting platform.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Write attempted against a store that only accepts change requests.
    #[error("read-only store: {0}")]
    ReadOnly(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ApidashError>;

impl ApidashError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a decode error from any displayable message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Create a validation error naming the offending field.
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "absent" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The field named by a validation error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ApidashError::config("missing token");
        assert_eq!(err.to_string(), "config error: missing token");

        let err = ApidashError::validation("assetId", "must match [A-Za-z0-9_-]+");
        assert_eq!(
            err.to_string(),
            "validation error on `assetId`: must match [A-Za-z0-9_-]+"
        );
        assert_eq!(err.field(), Some("assetId"));
    }

    #[test]
    fn not_found_is_distinguishable() {
        assert!(ApidashError::NotFound("teams.json".into()).is_not_found());
        assert!(!ApidashError::decode("bad base64").is_not_found());
        assert_eq!(ApidashError::Conflict("x".into()).field(), None);
    }
}
