pub mod acquisition;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod publisher;
pub mod runner;
pub mod schedule;
pub mod testing;
pub mod tools;
pub mod workspace;

pub use acquisition::{
    AcquisitionError, AcquisitionReport, Acquirer, ArtifactRequest, DownloadError,
    DownloadFailure, DownloadedArtifact, Downloader, HttpDownloader, SourceConfig,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, MetricsConfig,
    SanitizedConfig,
};
pub use pipeline::{
    ArtifactPipeline, PipelineConfig, PipelineOutcome, PipelineStage, PipelineState,
    PublicationKind, PublicationRecord, StageStatus,
};
pub use publisher::{
    ObjectPublisher, PublicationKey, PublishError, PublishedObject, Publisher, StorageConfig,
};
pub use runner::{FailedDownload, ProductionRunner, RunError, RunReport, RunRequest, Runner};
pub use schedule::{
    latest_published, resolve_release, ForecastOffset, OffsetRange, ReleaseHour, ReleaseWindow,
    ScheduleError,
};
pub use tools::{
    ComponentSpec, GdalToolkit, GeoToolkit, RasterSpec, Tool, ToolError, ToolsConfig, ZoomRange,
};
pub use workspace::{CleanupReport, Workspace, WorkspaceError};
