//! Object storage configuration.

use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::PublishError;

/// S3-compatible bucket the artifacts are published to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket name. Required.
    #[serde(default)]
    pub bucket: String,

    /// AWS region (defaults to `us-east-1`).
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint URL for S3-compatible services (e.g. MinIO).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key ID for static credentials.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key for static credentials.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Allow plain HTTP endpoints.
    #[serde(default)]
    pub allow_http: bool,

    /// Maximum concurrent uploads when publishing a directory.
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_upload_concurrency() -> usize {
    16
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            allow_http: false,
            upload_concurrency: default_upload_concurrency(),
        }
    }
}

impl StorageConfig {
    /// Creates a config for `bucket` with default settings.
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Location prefix reported for published objects.
    pub fn location_base(&self) -> String {
        format!("s3://{}", self.bucket)
    }

    /// Builds the S3 client.
    pub fn build_store(&self) -> Result<Arc<dyn ObjectStore>, PublishError> {
        if self.bucket.trim().is_empty() {
            return Err(PublishError::Connection(
                "storage bucket is not configured".to_string(),
            ));
        }

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&self.bucket)
            .with_region(&self.region);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint);
            if self.allow_http || endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }

        if let Some(access_key) = &self.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(secret_key) = &self.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        let store = builder
            .build()
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        Ok(Arc::new(store))
    }
}
