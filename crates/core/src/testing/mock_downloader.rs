//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::acquisition::{DownloadError, Downloader};

/// Mock implementation of the Downloader trait.
///
/// Successful downloads write a small fake GRIB payload to the destination.
/// Failing URLs return HTTP 404 and leave no file behind.
#[derive(Debug, Clone, Default)]
pub struct MockDownloader {
    /// Every URL requested, in order.
    requested: Arc<RwLock<Vec<String>>>,
    /// URLs that fail.
    failing: Arc<RwLock<HashSet<String>>>,
    /// Fail every request.
    fail_all: Arc<RwLock<bool>>,
}

impl MockDownloader {
    pub const PAYLOAD: &'static [u8] = b"GRIB mock forecast";

    /// Create a new mock downloader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make requests for `url` fail.
    pub async fn fail_url(&self, url: &str) {
        self.failing.write().await.insert(url.to_string());
    }

    /// Make every request fail.
    pub async fn fail_all(&self) {
        *self.fail_all.write().await = true;
    }

    /// Number of download attempts, failed ones included.
    pub async fn download_count(&self) -> usize {
        self.requested.read().await.len()
    }

    /// Get all requested URLs.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requested.read().await.clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        self.requested.write().await.push(url.to_string());

        if *self.fail_all.read().await || self.failing.read().await.contains(url) {
            return Err(DownloadError::Http { status: 404 });
        }

        tokio::fs::write(destination, Self::PAYLOAD)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        Ok(Self::PAYLOAD.len() as u64)
    }
}
