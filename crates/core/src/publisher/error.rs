//! Error types for the publisher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The storage client could not be built.
    #[error("Storage connection error: {0}")]
    Connection(String),

    /// Key is not a valid publication key or object path.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Local file or directory could not be read.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Streaming to the store failed.
    #[error("Upload of '{key}' failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Some files of a directory upload failed.
    #[error("{failed} of {total} uploads under '{prefix}' failed (first: {first_error})")]
    Directory {
        prefix: String,
        failed: usize,
        total: usize,
        first_error: String,
    },
}

impl PublishError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
