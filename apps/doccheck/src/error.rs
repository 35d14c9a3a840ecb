//! Fatal error types.
//!
//! Only failures that make a run meaningless live here: a mandatory source
//! file that cannot be read, or mandatory configuration that cannot be
//! parsed. Everything a document does wrong is a `Finding` instead.

use std::path::PathBuf;

/// Result type for doccheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a validation run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Required source file not found: {path}")]
    MissingSource { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {name}: {message}")]
    Invalid { name: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            message: message.into(),
        }
    }
}
