//! # Error Taxonomy
//!
//! Every failure the view layer can observe is one of these variants.
//! Controllers never let them escape: they become an `Error` screen state
//! or an inline status line.

use std::fmt;
use std::path::PathBuf;

use crate::core::accessor::ValueKind;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Nothing to work with (e.g. discovery found no documents).
    NotFound(String),
    /// A specific document failed to load or convert.
    LoadFailure { path: PathBuf, cause: String },
    /// The settings accessor rejected a malformed or out-of-domain value.
    Validation { key: String, reason: String },
    /// The settings accessor was given a key outside its registry.
    UnknownKey { key: String, kind: ValueKind },
    /// Unexpected failure in background work.
    Internal(String),
}

impl CoreError {
    pub fn load_failure(path: impl Into<PathBuf>, cause: impl fmt::Display) -> Self {
        CoreError::LoadFailure {
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    pub fn validation(key: &str, reason: impl Into<String>) -> Self {
        CoreError::Validation {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unknown_key(key: &str, kind: ValueKind) -> Self {
        CoreError::UnknownKey {
            key: key.to_string(),
            kind,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::NotFound(msg) => write!(f, "{msg}"),
            CoreError::LoadFailure { path, cause } => {
                write!(f, "failed to load {}: {cause}", path.display())
            }
            CoreError::Validation { key, reason } => write!(f, "invalid value for {key}: {reason}"),
            CoreError::UnknownKey { key, kind } => write!(f, "unknown {kind} key: {key}"),
            CoreError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_names_path_and_cause() {
        let err = CoreError::load_failure("book/a.xlsx", "bad zip header");
        let text = err.to_string();
        assert!(text.contains("book/a.xlsx"));
        assert!(text.contains("bad zip header"));
    }

    #[test]
    fn test_unknown_key_names_kind() {
        let err = CoreError::unknown_key("git.nope", ValueKind::Bool);
        assert_eq!(err.to_string(), "unknown boolean key: git.nope");
    }
}
