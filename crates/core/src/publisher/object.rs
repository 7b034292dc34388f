//! Publisher backed by [`object_store`].

use async_trait::async_trait;
use futures::StreamExt;
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::config::StorageConfig;
use super::error::PublishError;
use super::traits::{PublishedObject, Publisher};

/// Streams files into any [`ObjectStore`] backend.
#[derive(Clone, Debug)]
pub struct ObjectPublisher {
    store: Arc<dyn ObjectStore>,
    location_base: String,
    upload_concurrency: usize,
}

impl ObjectPublisher {
    /// Wraps a store; `location_base` prefixes reported locations.
    pub fn new(store: Arc<dyn ObjectStore>, location_base: impl Into<String>) -> Self {
        Self {
            store,
            location_base: location_base.into(),
            upload_concurrency: 16,
        }
    }

    /// Connects to the configured S3 bucket.
    pub fn from_config(config: &StorageConfig) -> Result<Self, PublishError> {
        let store = config.build_store()?;
        Ok(Self::new(store, config.location_base())
            .with_upload_concurrency(config.upload_concurrency))
    }

    /// Sets the directory upload concurrency (at least 1).
    pub fn with_upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency.max(1);
        self
    }

    fn location(&self, key: &str) -> String {
        format!("{}/{}", self.location_base.trim_end_matches('/'), key)
    }

    async fn upload(&self, local: &Path, key: &str) -> Result<PublishedObject, PublishError> {
        let path =
            ObjectPath::parse(key).map_err(|e| PublishError::invalid_key(key, e.to_string()))?;
        let mut file = File::open(local)
            .await
            .map_err(|e| PublishError::io(local, e))?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type(local).into());

        let mut writer =
            BufWriter::new(Arc::clone(&self.store), path).with_attributes(attributes);

        let copied = match tokio::io::copy(&mut file, &mut writer).await {
            Ok(copied) => copied,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    debug!(key = %key, error = %abort_err, "Failed to abort upload");
                }
                return Err(PublishError::Upload {
                    key: key.to_string(),
                    source: e,
                });
            }
        };

        if let Err(e) = writer.shutdown().await {
            if let Err(abort_err) = writer.abort().await {
                debug!(key = %key, error = %abort_err, "Failed to abort upload");
            }
            return Err(PublishError::Upload {
                key: key.to_string(),
                source: e,
            });
        }

        debug!(key = %key, bytes = copied, "Uploaded object");

        Ok(PublishedObject {
            key: key.to_string(),
            location: self.location(key),
            size_bytes: copied,
        })
    }
}

/// Content type from the file extension.
fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("json") => "application/json",
        Some("html") => "text/html",
        Some("xml") | Some("kml") => "application/xml",
        _ => "application/octet-stream",
    }
}

/// Lists every regular file below `root`, depth first.
async fn walk_files(root: &Path) -> Result<Vec<PathBuf>, PublishError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| PublishError::io(&dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PublishError::io(&dir, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| PublishError::io(entry.path(), e))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// `prefix/<relative path>` with `/` separators.
fn directory_key(prefix: &str, root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        Some(parts.join("/"))
    } else {
        Some(format!("{}/{}", prefix, parts.join("/")))
    }
}

#[async_trait]
impl Publisher for ObjectPublisher {
    fn name(&self) -> &str {
        "object_store"
    }

    async fn publish_image(
        &self,
        local: &Path,
        key: &str,
    ) -> Result<PublishedObject, PublishError> {
        self.upload(local, key).await
    }

    async fn publish_directory(
        &self,
        local_dir: &Path,
        key_prefix: &str,
    ) -> Result<Vec<PublishedObject>, PublishError> {
        let files = walk_files(local_dir).await?;
        let total = files.len();

        let uploads: Vec<(String, Result<PublishedObject, PublishError>)> =
            futures::stream::iter(files.into_iter().map(|file| async move {
                match directory_key(key_prefix, local_dir, &file) {
                    Some(key) => {
                        let result = self.upload(&file, &key).await;
                        (key, result)
                    }
                    None => {
                        let key = file.to_string_lossy().to_string();
                        let err = PublishError::invalid_key(&key, "outside published directory");
                        (key, Err(err))
                    }
                }
            }))
            .buffer_unordered(self.upload_concurrency)
            .collect()
            .await;

        let mut published = Vec::with_capacity(total);
        let mut failed = 0;
        let mut first_error = None;
        for (key, result) in uploads {
            match result {
                Ok(object) => published.push(object),
                Err(e) => {
                    warn!(key = %key, error = %e, "Directory upload failed");
                    failed += 1;
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Some(first_error) = first_error {
            return Err(PublishError::Directory {
                prefix: key_prefix.to_string(),
                failed,
                total,
                first_error,
            });
        }

        published.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream::BoxStream;
    use object_store::memory::InMemory;
    use object_store::{
        GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, PutMultipartOpts,
        PutOptions, PutPayload, PutResult,
    };
    use tempfile::TempDir;

    fn publisher() -> (ObjectPublisher, Arc<dyn ObjectStore>) {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        (ObjectPublisher::new(Arc::clone(&store), "memory://wind"), store)
    }

    async fn read(store: &Arc<dyn ObjectStore>, key: &str) -> Vec<u8> {
        store
            .get(&ObjectPath::from(key))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_publish_image_streams_file() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("wind_data.png");
        std::fs::write(&image, b"\x89PNG fake image").unwrap();

        let (publisher, store) = publisher();
        let object = publisher
            .publish_image(&image, "2024/03/01/09/wind_data.png")
            .await
            .unwrap();

        assert_eq!(object.key, "2024/03/01/09/wind_data.png");
        assert_eq!(object.location, "memory://wind/2024/03/01/09/wind_data.png");
        assert_eq!(object.size_bytes, 15);
        assert_eq!(read(&store, "2024/03/01/09/wind_data.png").await, b"\x89PNG fake image");
    }

    #[tokio::test]
    async fn test_publish_image_overwrites_same_key() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("wind_data.png");
        let (publisher, store) = publisher();

        std::fs::write(&image, b"first").unwrap();
        publisher.publish_image(&image, "2024/03/01/09/w.png").await.unwrap();
        std::fs::write(&image, b"second").unwrap();
        publisher.publish_image(&image, "2024/03/01/09/w.png").await.unwrap();

        assert_eq!(read(&store, "2024/03/01/09/w.png").await, b"second");
    }

    /// Store whose single-part puts always fail.
    #[derive(Debug)]
    struct RejectingStore(InMemory);

    impl std::fmt::Display for RejectingStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "RejectingStore")
        }
    }

    #[async_trait]
    impl ObjectStore for RejectingStore {
        async fn put_opts(
            &self,
            _location: &ObjectPath,
            _payload: PutPayload,
            _opts: PutOptions,
        ) -> object_store::Result<PutResult> {
            Err(object_store::Error::Generic {
                store: "rejecting",
                source: "bucket is read-only".into(),
            })
        }

        async fn put_multipart_opts(
            &self,
            location: &ObjectPath,
            opts: PutMultipartOpts,
        ) -> object_store::Result<Box<dyn MultipartUpload>> {
            self.0.put_multipart_opts(location, opts).await
        }

        async fn get_opts(
            &self,
            location: &ObjectPath,
            options: GetOptions,
        ) -> object_store::Result<GetResult> {
            self.0.get_opts(location, options).await
        }

        async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
            self.0.delete(location).await
        }

        fn list(
            &self,
            prefix: Option<&ObjectPath>,
        ) -> BoxStream<'static, object_store::Result<ObjectMeta>> {
            self.0.list(prefix)
        }

        async fn list_with_delimiter(
            &self,
            prefix: Option<&ObjectPath>,
        ) -> object_store::Result<ListResult> {
            self.0.list_with_delimiter(prefix).await
        }

        async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
            self.0.copy(from, to).await
        }

        async fn copy_if_not_exists(
            &self,
            from: &ObjectPath,
            to: &ObjectPath,
        ) -> object_store::Result<()> {
            self.0.copy_if_not_exists(from, to).await
        }
    }

    #[tokio::test]
    async fn test_publish_image_failed_commit_is_an_upload_error() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("wind_data.png");
        std::fs::write(&image, b"\x89PNG fake image").unwrap();

        let store: Arc<dyn ObjectStore> = Arc::new(RejectingStore(InMemory::new()));
        let publisher = ObjectPublisher::new(Arc::clone(&store), "memory://wind");
        let result = publisher
            .publish_image(&image, "2024/03/01/09/wind_data.png")
            .await;

        assert!(
            matches!(&result, Err(PublishError::Upload { key, .. }) if key == "2024/03/01/09/wind_data.png"),
            "{:?}",
            result
        );
        let listed: Vec<_> = store.list(None).collect().await;
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_publish_image_missing_file() {
        let dir = TempDir::new().unwrap();
        let (publisher, _) = publisher();
        let result = publisher
            .publish_image(&dir.path().join("missing.png"), "2024/03/01/09/w.png")
            .await;
        assert!(matches!(result, Err(PublishError::Io { .. })));
    }

    #[tokio::test]
    async fn test_publish_image_invalid_key() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("w.png");
        std::fs::write(&image, b"x").unwrap();
        let (publisher, _) = publisher();
        let result = publisher.publish_image(&image, "2024//03/w.png").await;
        assert!(matches!(result, Err(PublishError::InvalidKey { .. })));
    }

    #[tokio::test]
    async fn test_publish_directory_uses_relative_keys() {
        let dir = TempDir::new().unwrap();
        let tiles = dir.path().join("tiles");
        std::fs::create_dir_all(tiles.join("0/0")).unwrap();
        std::fs::create_dir_all(tiles.join("1/1")).unwrap();
        std::fs::write(tiles.join("0/0/0.png"), b"z0").unwrap();
        std::fs::write(tiles.join("1/1/0.png"), b"z1a").unwrap();
        std::fs::write(tiles.join("1/1/1.png"), b"z1b").unwrap();

        let (publisher, store) = publisher();
        let objects = publisher
            .publish_directory(&tiles, "2024/03/01/09/tiles/")
            .await
            .unwrap();

        let keys: Vec<&str> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "2024/03/01/09/tiles/0/0/0.png",
                "2024/03/01/09/tiles/1/1/0.png",
                "2024/03/01/09/tiles/1/1/1.png",
            ]
        );
        assert_eq!(read(&store, "2024/03/01/09/tiles/1/1/1.png").await, b"z1b");
    }

    #[tokio::test]
    async fn test_publish_directory_reports_partial_failure() {
        let dir = TempDir::new().unwrap();
        let tiles = dir.path().join("tiles");
        std::fs::create_dir_all(tiles.join("0/0")).unwrap();
        std::fs::write(tiles.join("0/0/0.png"), b"ok").unwrap();
        // Control characters are not valid in object keys.
        std::fs::write(tiles.join("0/0/bad\u{1}.png"), b"bad").unwrap();

        let (publisher, store) = publisher();
        let result = publisher.publish_directory(&tiles, "2024/03/01/09").await;

        match result {
            Err(PublishError::Directory {
                prefix,
                failed,
                total,
                first_error,
            }) => {
                assert_eq!(prefix, "2024/03/01/09");
                assert_eq!(failed, 1);
                assert_eq!(total, 2);
                assert!(first_error.contains("bad"), "{}", first_error);
            }
            other => panic!("expected directory error, got {:?}", other),
        }
        // Siblings of the failed tile are still uploaded.
        assert_eq!(read(&store, "2024/03/01/09/0/0/0.png").await, b"ok");
    }

    #[tokio::test]
    async fn test_publish_empty_directory() {
        let dir = TempDir::new().unwrap();
        let (publisher, _) = publisher();
        let objects = publisher
            .publish_directory(dir.path(), "2024/03/01/09/tiles")
            .await
            .unwrap();
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn test_publish_missing_directory() {
        let dir = TempDir::new().unwrap();
        let (publisher, _) = publisher();
        let result = publisher
            .publish_directory(&dir.path().join("nope"), "prefix")
            .await;
        assert!(matches!(result, Err(PublishError::Io { .. })));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a/wind.PNG")), "image/png");
        assert_eq!(content_type(Path::new("tilemapresource.xml")), "application/xml");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_directory_key() {
        let root = Path::new("/work/tiles");
        assert_eq!(
            directory_key("p/", root, Path::new("/work/tiles/2/1/3.png")).unwrap(),
            "p/2/1/3.png"
        );
        assert_eq!(
            directory_key("", root, Path::new("/work/tiles/2/1/3.png")).unwrap(),
            "2/1/3.png"
        );
        assert!(directory_key("p", root, Path::new("/elsewhere/x.png")).is_none());
    }
}
