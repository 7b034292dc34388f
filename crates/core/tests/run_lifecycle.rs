//! End-to-end run integration tests.
//!
//! These tests drive the runner with a mock downloader and toolkit:
//! - Release selection and availability
//! - Download failure isolation
//! - Publication keys, through the mock publisher and an in-memory store
//! - Scratch cleanup on every failure path

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use windmap_core::{
    testing::{MockDownloader, MockPublisher, MockToolkit},
    Config, ObjectPublisher, OffsetRange, PipelineStage, Publisher, RunError, RunReport,
    RunRequest, Runner, SourceConfig, StageStatus, Tool,
};

const URL_TEMPLATE: &str = "http://mirror/{YEAR}{MONTH}{DAY}/{RELEASE}/{FORECAST}.grib2";

/// Test helper wiring a runner to mocks over a scratch directory.
struct TestHarness<P: Publisher> {
    runner: Runner<MockDownloader, MockToolkit, P>,
    downloader: MockDownloader,
    toolkit: MockToolkit,
    scratch: TempDir,
}

fn config(scratch: &TempDir, offsets: OffsetRange, tiles: bool) -> Config {
    let mut config = Config::default();
    config.storage.bucket = "wind-tiles".to_string();
    config.source = SourceConfig::default()
        .with_url_template(URL_TEMPLATE)
        .with_offsets(offsets);
    config.pipeline = config
        .pipeline
        .with_scratch_dir(scratch.path())
        .with_tiles(tiles);
    config
}

impl<P: Publisher> TestHarness<P> {
    fn new(publisher: P, offsets: OffsetRange, tiles: bool) -> Self {
        let scratch = TempDir::new().expect("Failed to create scratch dir");
        let config = config(&scratch, offsets, tiles);
        let downloader = MockDownloader::new();
        let toolkit = MockToolkit::new();
        let runner = Runner::new(&config, downloader.clone(), toolkit.clone(), publisher);
        Self {
            runner,
            downloader,
            toolkit,
            scratch,
        }
    }

    async fn run_midnight_release(&self) -> Result<RunReport, RunError> {
        self.runner
            .run(
                RunRequest::at(noon())
                    .with_release("00")
                    .with_date(march_first()),
            )
            .await
    }

    /// Nothing is left in the download or working directories.
    fn assert_scratch_empty(&self) {
        for dir in ["downloads", "work"] {
            let path = self.scratch.path().join(dir);
            assert_eq!(entries(&path), 0, "{} is not empty", path.display());
        }
    }
}

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn four_offsets() -> OffsetRange {
    OffsetRange::new(9, 18, 3)
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

async fn stored_keys(store: &Arc<dyn ObjectStore>) -> Vec<String> {
    let mut keys: Vec<String> = store
        .list(None)
        .map_ok(|meta| meta.location.to_string())
        .try_collect()
        .await
        .unwrap();
    keys.sort();
    keys
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn test_end_to_end_without_tiles() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let publisher = ObjectPublisher::new(Arc::clone(&store), "memory://");
    let harness = TestHarness::new(publisher, four_offsets(), false);

    let report = assert_ok!(harness.run_midnight_release().await);

    assert_eq!(report.requested, 4);
    assert_eq!(report.downloaded, 4);
    assert!(report.is_complete());
    assert_eq!(harness.toolkit.invocation_count(Tool::Tile).await, 0);

    for outcome in &report.outcomes {
        let publications = &outcome.publications;
        assert_eq!(publications.len(), 1, "{}", outcome.artifact_id);
        assert!(outcome.cleanup.is_clean());
        assert_eq!(outcome.status(PipelineStage::Tiles), Some(&StageStatus::Skipped));
    }

    assert_eq!(
        stored_keys(&store).await,
        vec![
            "2024/03/01/09/wind_data.png",
            "2024/03/01/12/wind_data.png",
            "2024/03/01/15/wind_data.png",
            "2024/03/01/18/wind_data.png",
        ]
    );
    harness.assert_scratch_empty();
}

#[tokio::test]
async fn test_end_to_end_with_tiles() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let publisher = ObjectPublisher::new(Arc::clone(&store), "memory://");
    let harness = TestHarness::new(publisher, OffsetRange::new(9, 9, 3), true);

    let report = assert_ok!(harness.run_midnight_release().await);
    assert!(report.is_complete());

    assert_eq!(
        stored_keys(&store).await,
        vec![
            "2024/03/01/09/0/0/0.png",
            "2024/03/01/09/1/0/1.png",
            "2024/03/01/09/1/1/1.png",
            "2024/03/01/09/wind_data.png",
        ]
    );
    harness.assert_scratch_empty();
}

#[tokio::test]
async fn test_rerun_writes_the_same_keys() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let publisher = ObjectPublisher::new(Arc::clone(&store), "memory://");
    let harness = TestHarness::new(publisher, four_offsets(), false);

    let first = assert_ok!(harness.run_midnight_release().await);
    let keys_after_first = stored_keys(&store).await;
    let second = assert_ok!(harness.run_midnight_release().await);

    let mut first_keys = first.published_keys();
    let mut second_keys = second.published_keys();
    first_keys.sort();
    second_keys.sort();
    assert_eq!(first_keys, second_keys);
    assert_eq!(stored_keys(&store).await, keys_after_first);
}

// =============================================================================
// Availability and downloads
// =============================================================================

#[tokio::test]
async fn test_unpublished_release_downloads_nothing() {
    let harness = TestHarness::new(MockPublisher::new(), four_offsets(), false);

    let before_publication = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
    let error = assert_err!(
        harness
            .runner
            .run(RunRequest::at(before_publication).with_release("00"))
            .await
    );

    assert!(matches!(error, RunError::NotYetAvailable { .. }));
    assert_eq!(harness.downloader.download_count().await, 0);
    assert!(harness.toolkit.invocations().await.is_empty());
}

#[tokio::test]
async fn test_one_failed_download_among_five() {
    let publisher = MockPublisher::new();
    let harness = TestHarness::new(publisher.clone(), OffsetRange::new(9, 21, 3), false);
    harness
        .downloader
        .fail_url("http://mirror/20240301/00/15.grib2")
        .await;

    let report = assert_ok!(harness.run_midnight_release().await);

    assert_eq!(report.requested, 5);
    assert_eq!(report.downloaded, 4);
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.download_failures.len(), 1);
    assert_eq!(report.download_failures[0].error, "HTTP 404");
    assert_eq!(publisher.image_keys().await.len(), 4);
    assert!(!publisher
        .image_keys()
        .await
        .contains(&"2024/03/01/15/wind_data.png".to_string()));
    harness.assert_scratch_empty();
}

// =============================================================================
// Cleanup on failure
// =============================================================================

#[tokio::test]
async fn test_cleanup_after_failure_at_every_stage() {
    let cases = [
        (Tool::Extract, PipelineStage::Split),
        (Tool::Composite, PipelineStage::Composite),
        (Tool::Rasterize, PipelineStage::Raster),
        (Tool::Tile, PipelineStage::Tiles),
    ];

    for (tool, stage) in cases {
        let harness = TestHarness::new(MockPublisher::new(), four_offsets(), true);
        harness.toolkit.fail_at(tool).await;

        let report = assert_ok!(harness.run_midnight_release().await);

        assert_eq!(report.outcomes.len(), 4);
        for outcome in &report.outcomes {
            assert_eq!(outcome.failed_stage(), Some(stage), "failure at {}", tool);
            assert!(outcome.cleanup.is_clean(), "cleanup after {}", tool);
        }
        harness.assert_scratch_empty();
    }
}

#[tokio::test]
async fn test_failed_directory_upload_still_cleans_up() {
    let publisher = MockPublisher::new();
    publisher.fail_directories().await;
    let harness = TestHarness::new(publisher.clone(), four_offsets(), true);

    let report = assert_ok!(harness.run_midnight_release().await);

    assert!(!report.is_complete());
    for outcome in &report.outcomes {
        assert!(outcome.failed_stage().is_none());
        assert!(outcome.publications.iter().any(|p| !p.succeeded()));
        assert!(outcome.cleanup.is_clean());
    }
    assert_eq!(publisher.image_keys().await.len(), 4);
    assert!(publisher.directory_prefixes().await.is_empty());
    harness.assert_scratch_empty();
}
