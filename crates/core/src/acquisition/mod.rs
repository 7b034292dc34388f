//! Acquisition of forecast files.
//!
//! This module turns a [`ReleaseWindow`](crate::schedule::ReleaseWindow) into
//! the set of forecast files to fetch and downloads them concurrently to the
//! local scratch root:
//!
//! - Request construction from the configured URL template and offset range
//! - Availability check against the release's publication time
//! - Streaming downloads with per-file failure isolation
//!
//! # Example
//!
//! ```ignore
//! use windmap_core::acquisition::{Acquirer, HttpDownloader, SourceConfig};
//!
//! let config = SourceConfig::default();
//! let downloader = HttpDownloader::new(&config)?;
//! let acquirer = Acquirer::new(config, scratch_root, downloader);
//!
//! let report = acquirer.fetch_release_artifacts(window, Utc::now()).await?;
//! println!("{} downloaded, {} failed", report.downloaded.len(), report.failures.len());
//! ```

mod config;
mod error;
mod http;
mod stage;
mod traits;
mod types;

pub use config::SourceConfig;
pub use error::{AcquisitionError, DownloadError};
pub use http::HttpDownloader;
pub use stage::Acquirer;
pub use traits::Downloader;
pub use types::{AcquisitionReport, ArtifactRequest, DownloadFailure, DownloadedArtifact};
