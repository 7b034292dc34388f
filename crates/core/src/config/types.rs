use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::acquisition::SourceConfig;
use crate::pipeline::PipelineConfig;
use crate::publisher::StorageConfig;
use crate::schedule::OffsetRange;
use crate::tools::ToolsConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Write the Prometheus text exposition here after each run
    /// (node-exporter textfile collector).
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}

/// Sanitized config for logging (credentials redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub storage: SanitizedStorageConfig,
    pub source: SanitizedSourceConfig,
    pub pipeline: PipelineConfig,
    pub tools: ToolsConfig,
    pub metrics: MetricsConfig,
}

/// Storage config with credentials hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub bucket: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub credentials_configured: bool,
    pub upload_concurrency: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourceConfig {
    pub url_template: String,
    pub offsets: OffsetRange,
    pub request_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            storage: SanitizedStorageConfig {
                bucket: config.storage.bucket.clone(),
                region: config.storage.region.clone(),
                endpoint: config.storage.endpoint.clone(),
                credentials_configured: config.storage.access_key_id.is_some()
                    && config.storage.secret_access_key.is_some(),
                upload_concurrency: config.storage.upload_concurrency,
            },
            source: SanitizedSourceConfig {
                url_template: config.source.url_template.clone(),
                offsets: config.source.offsets,
                request_timeout_secs: config.source.request_timeout_secs,
            },
            pipeline: config.pipeline.clone(),
            tools: config.tools.clone(),
            metrics: config.metrics.clone(),
        }
    }
}
