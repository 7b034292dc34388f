//! Run driver.

use std::time::Instant;
use tracing::{info, warn};

use crate::acquisition::{Acquirer, Downloader, HttpDownloader, SourceConfig};
use crate::config::{validate_config, Config};
use crate::pipeline::{ArtifactPipeline, PipelineConfig};
use crate::publisher::{ObjectPublisher, Publisher};
use crate::schedule::resolve_release;
use crate::tools::{GdalToolkit, GeoToolkit};

use super::types::{FailedDownload, RunError, RunReport, RunRequest};

/// Runner over the real downloader, toolkit and object store.
pub type ProductionRunner = Runner<HttpDownloader, GdalToolkit, ObjectPublisher>;

/// Fetches one release and pushes every downloaded file through the pipeline.
pub struct Runner<D: Downloader, T: GeoToolkit, P: Publisher> {
    acquirer: Acquirer<D>,
    pipeline: ArtifactPipeline<T, P>,
}

impl<D: Downloader, T: GeoToolkit, P: Publisher> Runner<D, T, P> {
    /// Creates a runner from the `source` and `pipeline` sections of `config`.
    pub fn new(config: &Config, downloader: D, toolkit: T, publisher: P) -> Self {
        Self::with_parts(
            config.source.clone(),
            config.pipeline.clone(),
            downloader,
            toolkit,
            publisher,
        )
    }

    pub fn with_parts(
        source: SourceConfig,
        pipeline: PipelineConfig,
        downloader: D,
        toolkit: T,
        publisher: P,
    ) -> Self {
        let acquirer = Acquirer::new(source, pipeline.download_dir(), downloader);
        Self {
            acquirer,
            pipeline: ArtifactPipeline::new(pipeline, toolkit, publisher),
        }
    }

    /// Runs the requested release end to end.
    ///
    /// Fails only when the release cannot be resolved, is not published yet
    /// or the scratch root is unusable. Per-file failures are in the report.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport, RunError> {
        let start = Instant::now();
        let window = resolve_release(request.now, request.release.as_deref(), request.date)?;
        if request.release.is_none() {
            info!(release = %window, "No release requested, using latest published");
        }

        let acquisition = self
            .acquirer
            .fetch_release_artifacts(window, request.now)
            .await?;

        let requested = acquisition.requested();
        let downloaded = acquisition.downloaded.len();
        let download_failures: Vec<FailedDownload> =
            acquisition.failures.iter().map(FailedDownload::from).collect();

        if downloaded == 0 {
            warn!(release = %window, requested, "No forecast files downloaded");
        }

        let outcomes = self.pipeline.process_all(acquisition.downloaded).await;

        let report = RunReport {
            release: window,
            requested,
            downloaded,
            download_failures,
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            release = %window,
            requested,
            downloaded,
            complete = report.complete_count(),
            published = report.published_keys().len(),
            duration_ms = report.duration_ms,
            "Run finished"
        );

        Ok(report)
    }
}

impl ProductionRunner {
    /// Validates `config` and builds the HTTP, GDAL and object-store backends.
    pub fn from_config(config: &Config) -> Result<Self, RunError> {
        validate_config(config)?;

        let downloader = HttpDownloader::new(&config.source)?;
        let toolkit = GdalToolkit::new(config.tools.clone());
        let publisher = ObjectPublisher::from_config(&config.storage)?;

        info!(
            bucket = %config.storage.bucket,
            tiles = config.pipeline.generate_tiles,
            replicate_hours = config.pipeline.replicate_hours,
            "Runner configured"
        );

        Ok(Self::new(config, downloader, toolkit, publisher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::OffsetRange;
    use crate::testing::{MockDownloader, MockPublisher, MockToolkit};
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn config(scratch: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.bucket = "wind-tiles".to_string();
        config.source = SourceConfig::default()
            .with_url_template("http://mirror/{YEAR}{MONTH}{DAY}/{RELEASE}/{FORECAST}.grib2")
            .with_offsets(OffsetRange::new(9, 15, 3));
        config.pipeline = PipelineConfig::default().with_scratch_dir(scratch.path());
        config
    }

    fn runner(
        config: &Config,
        downloader: MockDownloader,
    ) -> Runner<MockDownloader, MockToolkit, MockPublisher> {
        Runner::new(config, downloader, MockToolkit::new(), MockPublisher::new())
    }

    #[tokio::test]
    async fn test_run_requested_release() {
        let scratch = TempDir::new().unwrap();
        let config = config(&scratch);
        let runner = runner(&config, MockDownloader::new());

        let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = runner
            .run(RunRequest::at(now).with_release("12").with_date(date))
            .await
            .unwrap();

        assert_eq!(report.requested, 3);
        assert_eq!(report.downloaded, 3);
        assert!(report.is_complete());

        let mut keys = report.published_keys();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "2024/03/01/21/wind_data.png",
                "2024/03/02/00/wind_data.png",
                "2024/03/02/03/wind_data.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_download_failure_is_reported() {
        let scratch = TempDir::new().unwrap();
        let config = config(&scratch);
        let downloader = MockDownloader::new();
        downloader
            .fail_url("http://mirror/20240301/00/12.grib2")
            .await;
        let runner = runner(&config, downloader);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let report = runner.run(RunRequest::at(now)).await.unwrap();

        assert_eq!(report.requested, 3);
        assert_eq!(report.downloaded, 2);
        assert_eq!(report.download_failures.len(), 1);
        assert_eq!(report.download_failures[0].artifact_id, "ecmwf_2024_03_01_00_12");
        assert!(!report.is_complete());
        assert_eq!(report.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_unpublished_release_downloads_nothing() {
        let scratch = TempDir::new().unwrap();
        let config = config(&scratch);
        let downloader = MockDownloader::new();
        let runner = runner(&config, downloader.clone());

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let result = runner.run(RunRequest::at(now).with_release("12")).await;

        let error = result.unwrap_err();
        assert!(matches!(error, RunError::NotYetAvailable { .. }));
        assert_eq!(error.exit_code(), 3);
        assert_eq!(downloader.download_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_release_hour() {
        let scratch = TempDir::new().unwrap();
        let config = config(&scratch);
        let runner = runner(&config, MockDownloader::new());

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let error = runner
            .run(RunRequest::at(now).with_release("06"))
            .await
            .unwrap_err();
        assert!(matches!(error, RunError::Schedule(_)));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_production_runner_rejects_invalid_config() {
        let result = ProductionRunner::from_config(&Config::default());
        assert!(matches!(result, Err(RunError::Config(_))));
    }
}
