//! External geospatial tool invocations.
//!
//! This module provides the `GeoToolkit` trait and a process-backed
//! implementation driving the ecCodes and GDAL command line tools:
//!
//! - Component extraction (`grib_copy`)
//! - Composite raster description (`gdalbuildvrt`)
//! - Byte-quantised raster and PNG rendering (`gdal_translate`)
//! - XYZ tile pyramids (`gdal2tiles.py`)
//!
//! Every invocation is a black box: it succeeds when the process exits with
//! status zero and the declared output exists.
//!
//! # Example
//!
//! ```ignore
//! use windmap_core::tools::{GdalToolkit, GeoToolkit, ToolsConfig};
//!
//! let toolkit = GdalToolkit::new(ToolsConfig::default());
//! toolkit.validate().await?;
//!
//! let u = toolkit
//!     .extract_component(&grib, &ComponentSpec::new("u", "shortName=10u"), &area.join("u.grib2"))
//!     .await?;
//! ```

mod config;
mod error;
mod gdal;
mod traits;
mod types;

pub use config::ToolsConfig;
pub use error::ToolError;
pub use gdal::GdalToolkit;
pub use traits::GeoToolkit;
pub use types::{ComponentSpec, RasterSpec, Tool, ZoomRange};
