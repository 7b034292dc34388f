//! Error types for the acquisition module.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schedule::{ReleaseWindow, ScheduleError};

/// Errors that abort acquisition of a whole release.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The release has not been published yet.
    #[error("Release {window} is not available yet, try again after {available_at}")]
    NotYetAvailable {
        window: ReleaseWindow,
        available_at: DateTime<Utc>,
    },

    /// The configured offset range is invalid.
    #[error("Invalid forecast offsets: {0}")]
    InvalidOffsets(#[from] ScheduleError),

    /// The download directory could not be created.
    #[error("Failed to create download directory: {path}")]
    DownloadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors for a single file download.
///
/// These never abort sibling downloads; they are collected into the
/// acquisition report.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// Connection to the remote host failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request or body transfer timed out.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// The body stream broke off mid-transfer.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The local file could not be written.
    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an I/O error for the given destination.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classifies a reqwest error.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::ConnectionFailed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else {
            Self::Transfer(e.to_string())
        }
    }
}
