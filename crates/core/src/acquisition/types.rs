//! Types for the acquisition module.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::schedule::{ForecastOffset, ReleaseWindow};

use super::error::DownloadError;

/// One forecast file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    /// Release the file belongs to.
    pub window: ReleaseWindow,
    /// Forecast offset within the release.
    pub offset: ForecastOffset,
    /// Resolved source URL.
    pub url: String,
}

impl ArtifactRequest {
    pub fn new(window: ReleaseWindow, offset: ForecastOffset, url: String) -> Self {
        Self {
            window,
            offset,
            url,
        }
    }

    /// Stable identifier, e.g. `ecmwf_2024_03_01_12_9`.
    pub fn id(&self) -> String {
        format!(
            "ecmwf_{}_{}_{}",
            self.window.date.format("%Y_%m_%d"),
            self.window.hour.code(),
            self.offset.hours()
        )
    }

    /// Local file name for the downloaded file.
    pub fn file_name(&self) -> String {
        format!("{}.grib2", self.id())
    }

    /// Timestamp the forecast is valid for.
    pub fn forecast_timestamp(&self) -> DateTime<Utc> {
        self.window.forecast_timestamp(self.offset)
    }
}

/// A forecast file fetched to local disk.
///
/// Owned by exactly one pipeline, which deletes `path` when it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub request: ArtifactRequest,
    /// Local path of the downloaded file.
    pub path: PathBuf,
    /// Size of the downloaded file in bytes.
    pub size_bytes: u64,
    /// Release run time plus forecast offset, in UTC.
    pub forecast_timestamp: DateTime<Utc>,
}

impl DownloadedArtifact {
    pub fn new(request: ArtifactRequest, path: PathBuf, size_bytes: u64) -> Self {
        let forecast_timestamp = request.forecast_timestamp();
        Self {
            request,
            path,
            size_bytes,
            forecast_timestamp,
        }
    }

    pub fn id(&self) -> String {
        self.request.id()
    }
}

/// A download that did not complete.
#[derive(Debug)]
pub struct DownloadFailure {
    pub request: ArtifactRequest,
    pub error: DownloadError,
}

/// Result of fetching one release.
#[derive(Debug)]
pub struct AcquisitionReport {
    pub window: ReleaseWindow,
    /// Files that were fetched, in offset order.
    pub downloaded: Vec<DownloadedArtifact>,
    /// Files that could not be fetched, in offset order.
    pub failures: Vec<DownloadFailure>,
}

impl AcquisitionReport {
    /// Number of files that were requested.
    pub fn requested(&self) -> usize {
        self.downloaded.len() + self.failures.len()
    }

    /// Whether every requested file was fetched.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ReleaseHour;
    use chrono::{NaiveDate, TimeZone};

    fn request(offset: u16) -> ArtifactRequest {
        ArtifactRequest::new(
            ReleaseWindow::new(
                ReleaseHour::Noon,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ),
            ForecastOffset::new(offset).unwrap(),
            "http://example/file".to_string(),
        )
    }

    #[test]
    fn test_request_id_and_file_name() {
        let req = request(9);
        assert_eq!(req.id(), "ecmwf_2024_03_01_12_9");
        assert_eq!(req.file_name(), "ecmwf_2024_03_01_12_9.grib2");
    }

    #[test]
    fn test_downloaded_artifact_timestamp() {
        let artifact = DownloadedArtifact::new(request(15), PathBuf::from("/tmp/x.grib2"), 10);
        assert_eq!(
            artifact.forecast_timestamp,
            Utc.with_ymd_and_hms(2024, 3, 2, 3, 0, 0).unwrap()
        );
        assert_eq!(artifact.id(), "ecmwf_2024_03_01_12_15");
    }
}
