//! Concurrent acquisition of a release's forecast files.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::metrics;
use crate::schedule::ReleaseWindow;

use super::config::SourceConfig;
use super::error::AcquisitionError;
use super::traits::Downloader;
use super::types::{AcquisitionReport, ArtifactRequest, DownloadFailure, DownloadedArtifact};

/// Fetches every forecast file of a release.
pub struct Acquirer<D: Downloader> {
    config: SourceConfig,
    download_dir: PathBuf,
    downloader: D,
}

impl<D: Downloader> Acquirer<D> {
    /// Creates an acquirer writing files into `download_dir`.
    pub fn new(config: SourceConfig, download_dir: PathBuf, downloader: D) -> Self {
        Self {
            config,
            download_dir,
            downloader,
        }
    }

    /// Directory downloaded files are written to.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Builds the request for every configured offset of `window`.
    pub fn build_requests(
        &self,
        window: ReleaseWindow,
    ) -> Result<Vec<ArtifactRequest>, AcquisitionError> {
        let requests = self
            .config
            .offsets
            .offsets()?
            .into_iter()
            .map(|offset| {
                ArtifactRequest::new(window, offset, self.config.resolve_url(&window, offset))
            })
            .collect();
        Ok(requests)
    }

    /// Downloads all files of `window` concurrently.
    ///
    /// Fails with [`AcquisitionError::NotYetAvailable`] without downloading
    /// anything when the release is not published at `now`. Individual
    /// download failures are recorded in the report and never abort the
    /// others.
    pub async fn fetch_release_artifacts(
        &self,
        window: ReleaseWindow,
        now: DateTime<Utc>,
    ) -> Result<AcquisitionReport, AcquisitionError> {
        let requests = self.build_requests(window)?;

        if !window.is_available(now) {
            return Err(AcquisitionError::NotYetAvailable {
                window,
                available_at: window.available_at(),
            });
        }

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| AcquisitionError::DownloadDirectory {
                path: self.download_dir.clone(),
                source: e,
            })?;

        info!(
            release = %window,
            files = requests.len(),
            downloader = self.downloader.name(),
            "Downloading release"
        );

        let results =
            futures::future::join_all(requests.into_iter().map(|request| self.fetch_one(request)))
                .await;

        let mut report = AcquisitionReport {
            window,
            downloaded: Vec::new(),
            failures: Vec::new(),
        };
        for result in results {
            match result {
                Ok(artifact) => report.downloaded.push(artifact),
                Err(failure) => report.failures.push(failure),
            }
        }

        info!(
            release = %window,
            downloaded = report.downloaded.len(),
            failed = report.failures.len(),
            "Release download finished"
        );

        Ok(report)
    }

    async fn fetch_one(
        &self,
        request: ArtifactRequest,
    ) -> Result<DownloadedArtifact, DownloadFailure> {
        let start = Instant::now();
        let destination = self.download_dir.join(request.file_name());

        match self.downloader.download(&request.url, &destination).await {
            Ok(bytes) => {
                metrics::DOWNLOADS_TOTAL.with_label_values(&["success"]).inc();
                metrics::DOWNLOAD_DURATION
                    .with_label_values(&["success"])
                    .observe(start.elapsed().as_secs_f64());
                metrics::DOWNLOAD_BYTES.inc_by(bytes);
                info!(
                    artifact = %request.id(),
                    bytes,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Downloaded forecast file"
                );
                Ok(DownloadedArtifact::new(request, destination, bytes))
            }
            Err(error) => {
                metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                metrics::DOWNLOAD_DURATION
                    .with_label_values(&["failed"])
                    .observe(start.elapsed().as_secs_f64());
                warn!(
                    artifact = %request.id(),
                    url = %request.url,
                    error = %error,
                    "Failed to download forecast file"
                );
                Err(DownloadFailure { request, error })
            }
        }
    }
}
