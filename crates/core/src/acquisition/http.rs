//! HTTP downloader backed by reqwest.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::workspace::delete_input;

use super::config::SourceConfig;
use super::error::DownloadError;
use super::traits::Downloader;

/// Streams HTTP(S) responses straight to disk.
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader using the timeouts from `config`.
    pub fn new(config: &SourceConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    async fn stream_to_file(
        response: reqwest::Response,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        let file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(DownloadError::from_reqwest)?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(destination, e))?;
            written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        Ok(written)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn name(&self) -> &str {
        "http"
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        debug!(url = %url, destination = %destination.display(), "Starting download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(DownloadError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Http {
                status: status.as_u16(),
            });
        }

        let result = Self::stream_to_file(response, destination).await;
        if result.is_err() {
            // Never hand a truncated file to the pipeline.
            delete_input(destination).await;
        }
        result
    }
}
