//! Trait definitions for the acquisition module.

use async_trait::async_trait;
use std::path::Path;

use super::error::DownloadError;

/// Fetches a remote file into a local path.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Streams `url` into `destination`, returning the number of bytes written.
    ///
    /// On failure no partial file is left at `destination`.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64, DownloadError>;
}
