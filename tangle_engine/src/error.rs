/// Error types of the engine crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A color specification that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("color {0:?} must start with '#'")]
    MissingHash(String),

    #[error("color {0:?} must be #rgb, #rrggbb or #rrggbbaa")]
    BadLength(String),

    #[error("color {0:?} contains non-hex digits")]
    BadDigit(String),
}

/// Configuration that cannot be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("palette entry {field}: {source}")]
    Palette {
        field: &'static str,
        #[source]
        source: StyleError,
    },

    #[error("key_length must be at least 1")]
    KeyLength,
}

/// A broken engine invariant. Always a bug in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[INVARIANT:{check}] {message}")]
pub struct InvariantViolation {
    pub check: &'static str,
    pub message: String,
}

impl InvariantViolation {
    pub(crate) fn new(check: &'static str, message: impl Into<String>) -> Self {
        Self {
            check,
            message: message.into(),
        }
    }
}
