//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tools::{ComponentSpec, RasterSpec, ZoomRange};

/// Configuration for the per-artifact pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root for downloads and per-artifact working areas.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Render and publish an XYZ tile pyramid.
    #[serde(default)]
    pub generate_tiles: bool,

    /// Consecutive hourly slots the preview image is published to.
    #[serde(default = "default_replicate_hours")]
    pub replicate_hours: u32,

    /// Object name of the preview image.
    #[serde(default = "default_preview_name")]
    pub preview_name: String,

    /// Coordinate reference system assigned to the composite.
    #[serde(default = "default_crs")]
    pub crs: String,

    /// Wind components extracted from each forecast file.
    #[serde(default = "ComponentSpec::wind_defaults")]
    pub components: Vec<ComponentSpec>,

    /// Preview raster geometry and scaling.
    #[serde(default)]
    pub raster: RasterSpec,

    /// Tile pyramid zoom levels.
    #[serde(default)]
    pub zoom: ZoomRange,
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("windmap")
}

fn default_replicate_hours() -> u32 {
    1
}

fn default_preview_name() -> String {
    "wind_data.png".to_string()
}

fn default_crs() -> String {
    "EPSG:4326".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            generate_tiles: false,
            replicate_hours: default_replicate_hours(),
            preview_name: default_preview_name(),
            crs: default_crs(),
            components: ComponentSpec::wind_defaults(),
            raster: RasterSpec::default(),
            zoom: ZoomRange::default(),
        }
    }
}

impl PipelineConfig {
    /// Directory downloaded forecast files are written to.
    pub fn download_dir(&self) -> PathBuf {
        self.scratch_dir.join("downloads")
    }

    /// Directory holding per-artifact working areas.
    pub fn work_dir(&self) -> PathBuf {
        self.scratch_dir.join("work")
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_tiles(mut self, enabled: bool) -> Self {
        self.generate_tiles = enabled;
        self
    }

    pub fn with_replicate_hours(mut self, hours: u32) -> Self {
        self.replicate_hours = hours;
        self
    }
}
