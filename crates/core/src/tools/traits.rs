//! Trait definitions for the tools module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ToolError;
use super::types::{ComponentSpec, RasterSpec, ZoomRange};

/// Geospatial transformations needed to turn a forecast file into images.
///
/// Each operation writes to a caller-chosen output path inside a working
/// area and returns that path once the output is known to exist.
#[async_trait]
pub trait GeoToolkit: Send + Sync {
    /// Returns the name of this toolkit implementation.
    fn name(&self) -> &str;

    /// Extracts a single wind component from a GRIB file.
    async fn extract_component(
        &self,
        input: &Path,
        component: &ComponentSpec,
        output: &Path,
    ) -> Result<PathBuf, ToolError>;

    /// Stacks component rasters as separate bands of a virtual raster.
    async fn build_composite(
        &self,
        components: &[PathBuf],
        crs: &str,
        output: &Path,
    ) -> Result<PathBuf, ToolError>;

    /// Renders the composite into a byte-scaled GeoTIFF.
    async fn rasterize(
        &self,
        composite: &Path,
        spec: &RasterSpec,
        output: &Path,
    ) -> Result<PathBuf, ToolError>;

    /// Converts a raster to PNG.
    async fn convert_image(&self, raster: &Path, output: &Path) -> Result<PathBuf, ToolError>;

    /// Renders an XYZ tile pyramid into `output_dir`.
    async fn generate_tiles(
        &self,
        raster: &Path,
        zoom: ZoomRange,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError>;

    /// Validates that every required program is reachable.
    async fn validate(&self) -> Result<(), ToolError>;
}
