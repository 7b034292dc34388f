//! Types for the tools module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The external tool steps of the per-artifact pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Extracts one physical quantity from a GRIB file.
    Extract,
    /// Combines component rasters into a multi-band description.
    Composite,
    /// Quantises the composite into an 8-bit raster.
    Rasterize,
    /// Converts the raster into a PNG image.
    Convert,
    /// Renders the raster into an XYZ tile pyramid.
    Tile,
}

impl Tool {
    /// Name of the underlying program, used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Extract => "grib_copy",
            Tool::Composite => "gdalbuildvrt",
            Tool::Rasterize => "gdal_translate",
            Tool::Convert => "gdal_translate_png",
            Tool::Tile => "gdal2tiles",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wind component to extract from a forecast file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Short label used for the working file name (`u`, `v`).
    pub name: String,
    /// `grib_copy -w` selector, e.g. `shortName=10u`.
    pub selector: String,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }

    /// Eastward and northward 10 metre wind.
    pub fn wind_defaults() -> Vec<Self> {
        vec![
            Self::new("u", "shortName=10u"),
            Self::new("v", "shortName=10v"),
        ]
    }

    /// File name of the extracted component inside a working area.
    pub fn file_name(&self) -> String {
        format!("{}.grib2", self.name)
    }
}

/// Geometry and value scaling of the quantised raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterSpec {
    /// Output width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Output height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Source value mapped to 0.
    #[serde(default = "default_scale_min")]
    pub scale_min: f64,
    /// Source value mapped to 255.
    #[serde(default = "default_scale_max")]
    pub scale_max: f64,
    /// Composite bands written to the output, in order.
    #[serde(default = "default_bands")]
    pub bands: Vec<u32>,
}

fn default_width() -> u32 {
    360
}

fn default_height() -> u32 {
    180
}

fn default_scale_min() -> f64 {
    -40.0
}

fn default_scale_max() -> f64 {
    40.0
}

fn default_bands() -> Vec<u32> {
    // u, v and v again as the blue channel
    vec![1, 2, 2]
}

impl Default for RasterSpec {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scale_min: default_scale_min(),
            scale_max: default_scale_max(),
            bands: default_bands(),
        }
    }
}

/// Inclusive zoom levels of a tile pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl ZoomRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 0, max: 3 }
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}
