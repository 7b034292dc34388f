//! Mock publisher for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::publisher::{PublishError, PublishedObject, Publisher};

/// Mock implementation of the Publisher trait.
///
/// Records successful publications in memory. Local files must exist, as
/// they would for a real upload.
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    /// Keys of successfully published images.
    images: Arc<RwLock<Vec<String>>>,
    /// Prefixes of successfully published directories.
    directories: Arc<RwLock<Vec<String>>>,
    /// Image keys that fail.
    failing_keys: Arc<RwLock<HashSet<String>>>,
    /// Fail every directory publication.
    fail_directories: Arc<RwLock<bool>>,
}

impl MockPublisher {
    /// Create a new mock publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make publishing to `key` fail.
    pub async fn fail_key(&self, key: &str) {
        self.failing_keys.write().await.insert(key.to_string());
    }

    /// Make every directory publication fail.
    pub async fn fail_directories(&self) {
        *self.fail_directories.write().await = true;
    }

    /// Keys of successfully published images, in completion order.
    pub async fn image_keys(&self) -> Vec<String> {
        self.images.read().await.clone()
    }

    /// Prefixes of successfully published directories.
    pub async fn directory_prefixes(&self) -> Vec<String> {
        self.directories.read().await.clone()
    }

    fn object(key: String, size_bytes: u64) -> PublishedObject {
        PublishedObject {
            location: format!("mock://{}", key),
            key,
            size_bytes,
        }
    }

    async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
        let mut files = Vec::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current)
                .await
                .map_err(|e| PublishError::io(&current, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| PublishError::io(&current, e))?
            {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish_image(
        &self,
        local: &Path,
        key: &str,
    ) -> Result<PublishedObject, PublishError> {
        let metadata = tokio::fs::metadata(local)
            .await
            .map_err(|e| PublishError::io(local, e))?;

        if self.failing_keys.read().await.contains(key) {
            return Err(PublishError::Upload {
                key: key.to_string(),
                source: std::io::Error::other("mock upload failure"),
            });
        }

        self.images.write().await.push(key.to_string());
        Ok(Self::object(key.to_string(), metadata.len()))
    }

    async fn publish_directory(
        &self,
        local_dir: &Path,
        key_prefix: &str,
    ) -> Result<Vec<PublishedObject>, PublishError> {
        let files = Self::list_files(local_dir).await?;

        if *self.fail_directories.read().await {
            return Err(PublishError::Directory {
                prefix: key_prefix.to_string(),
                failed: files.len(),
                total: files.len(),
                first_error: "mock upload failure".to_string(),
            });
        }

        let mut published = Vec::with_capacity(files.len());
        for file in files {
            let relative = file
                .strip_prefix(local_dir)
                .map_err(|e| PublishError::invalid_key(file.display().to_string(), e.to_string()))?;
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            let key = format!("{}/{}", key_prefix.trim_end_matches('/'), relative.join("/"));
            let size = tokio::fs::metadata(&file)
                .await
                .map_err(|e| PublishError::io(&file, e))?
                .len();
            published.push(Self::object(key, size));
        }

        self.directories.write().await.push(key_prefix.to_string());
        Ok(published)
    }
}
