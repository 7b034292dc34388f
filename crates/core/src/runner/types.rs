//! Types for the runner module.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::acquisition::{AcquisitionError, DownloadError, DownloadFailure};
use crate::config::ConfigError;
use crate::pipeline::PipelineOutcome;
use crate::publisher::PublishError;
use crate::schedule::{ReleaseWindow, ScheduleError};

/// Failures that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid release: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("release {window} is not available yet, try again after {available_at}")]
    NotYetAvailable {
        window: ReleaseWindow,
        available_at: DateTime<Utc>,
    },

    #[error("acquisition failed: {0}")]
    Acquisition(AcquisitionError),

    #[error("object storage setup failed: {0}")]
    Storage(#[from] PublishError),

    #[error("downloader setup failed: {0}")]
    Download(#[from] DownloadError),
}

impl RunError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Schedule(_) => 2,
            Self::NotYetAvailable { .. } => 3,
            Self::Acquisition(_) | Self::Storage(_) | Self::Download(_) => 1,
        }
    }
}

impl From<AcquisitionError> for RunError {
    fn from(e: AcquisitionError) -> Self {
        match e {
            AcquisitionError::NotYetAvailable {
                window,
                available_at,
            } => Self::NotYetAvailable {
                window,
                available_at,
            },
            AcquisitionError::InvalidOffsets(e) => Self::Schedule(e),
            other => Self::Acquisition(other),
        }
    }
}

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Release hour code (`"00"` or `"12"`); latest published when absent.
    pub release: Option<String>,
    /// Release date; today (UTC) when absent.
    pub date: Option<NaiveDate>,
    /// The instant availability is judged against.
    pub now: DateTime<Utc>,
}

impl RunRequest {
    /// Runs the latest release published at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            release: None,
            date: None,
            now,
        }
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// A file that could not be fetched, as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub artifact_id: String,
    pub url: String,
    pub error: String,
}

impl From<&DownloadFailure> for FailedDownload {
    fn from(failure: &DownloadFailure) -> Self {
        Self {
            artifact_id: failure.request.id(),
            url: failure.request.url.clone(),
            error: failure.error.to_string(),
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub release: ReleaseWindow,
    /// Files requested from the source.
    pub requested: usize,
    /// Files fetched to local disk.
    pub downloaded: usize,
    pub download_failures: Vec<FailedDownload>,
    /// One outcome per downloaded file.
    pub outcomes: Vec<PipelineOutcome>,
    pub duration_ms: u64,
}

impl RunReport {
    /// Every key written during the run.
    pub fn published_keys(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .flat_map(|o| o.published_keys())
            .collect()
    }

    /// Number of files that went through every stage and publication.
    pub fn complete_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_complete()).count()
    }

    /// Every requested file was fetched, processed and published.
    pub fn is_complete(&self) -> bool {
        self.download_failures.is_empty() && self.complete_count() == self.outcomes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ReleaseHour;
    use chrono::TimeZone;

    fn window() -> ReleaseWindow {
        ReleaseWindow::new(
            ReleaseHour::Noon,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    #[test]
    fn test_exit_codes() {
        let config = RunError::Config(ConfigError::ValidationError("bucket".into()));
        assert_eq!(config.exit_code(), 2);

        let schedule = RunError::Schedule(ScheduleError::InvalidReleaseHour("18".into()));
        assert_eq!(schedule.exit_code(), 2);

        let pending = RunError::NotYetAvailable {
            window: window(),
            available_at: window().available_at(),
        };
        assert_eq!(pending.exit_code(), 3);

        let storage = RunError::Storage(PublishError::Connection("refused".into()));
        assert_eq!(storage.exit_code(), 1);
    }

    #[test]
    fn test_not_yet_available_is_lifted() {
        let available_at = window().available_at();
        let error = RunError::from(AcquisitionError::NotYetAvailable {
            window: window(),
            available_at,
        });
        assert!(matches!(
            error,
            RunError::NotYetAvailable { available_at: at, .. } if at == available_at
        ));
    }

    #[test]
    fn test_request_builders() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let request = RunRequest::at(now).with_release("00").with_date(date);
        assert_eq!(request.release.as_deref(), Some("00"));
        assert_eq!(request.date, Some(date));
        assert_eq!(request.now, now);
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = RunReport {
            release: window(),
            requested: 0,
            downloaded: 0,
            download_failures: Vec::new(),
            outcomes: Vec::new(),
            duration_ms: 0,
        };
        assert!(report.is_complete());
        assert!(report.published_keys().is_empty());
    }
}
