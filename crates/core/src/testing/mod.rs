//! Testing utilities and mock implementations.
//!
//! Mocks for every external boundary of a run: the HTTP source, the
//! geospatial tools and the object store. They record what they were asked
//! to do and can be told to fail, so pipelines can be exercised end to end
//! without network access or GDAL installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use windmap_core::testing::{MockDownloader, MockPublisher, MockToolkit};
//! use windmap_core::tools::Tool;
//!
//! let downloader = MockDownloader::new();
//! let toolkit = MockToolkit::new();
//! let publisher = MockPublisher::new();
//!
//! // Inject failures
//! downloader.fail_url("https://data.ecmwf.int/.../12h-oper-fc.grib2").await;
//! toolkit.fail_at(Tool::Composite).await;
//!
//! // Run, then assert on what happened
//! assert_eq!(publisher.image_keys().await.len(), 3);
//! ```

mod mock_downloader;
mod mock_publisher;
mod mock_toolkit;

pub use mock_downloader::MockDownloader;
pub use mock_publisher::MockPublisher;
pub use mock_toolkit::MockToolkit;
