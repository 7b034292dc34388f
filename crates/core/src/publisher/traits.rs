//! Trait definitions for the publisher module.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use super::error::PublishError;

/// An object written to remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedObject {
    /// Object key.
    pub key: String,
    /// Remote location, e.g. `s3://bucket/2024/03/01/09/wind_data.png`.
    pub location: String,
    /// Bytes uploaded.
    pub size_bytes: u64,
}

/// Destination for rendered artifacts.
///
/// Implementations must be safe to share across concurrent pipelines
/// publishing distinct keys.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the name of this publisher implementation.
    fn name(&self) -> &str;

    /// Streams a single local file to `key`.
    async fn publish_image(&self, local: &Path, key: &str)
        -> Result<PublishedObject, PublishError>;

    /// Uploads every regular file under `local_dir` to
    /// `key_prefix/<relative path>`.
    ///
    /// Succeeds only if every upload succeeds.
    async fn publish_directory(
        &self,
        local_dir: &Path,
        key_prefix: &str,
    ) -> Result<Vec<PublishedObject>, PublishError>;
}
