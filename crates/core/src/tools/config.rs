//! Configuration for the tools module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Program paths and limits for the external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the ecCodes `grib_copy` binary.
    #[serde(default = "default_grib_copy")]
    pub grib_copy_path: PathBuf,

    /// Path to `gdalbuildvrt`.
    #[serde(default = "default_gdalbuildvrt")]
    pub gdalbuildvrt_path: PathBuf,

    /// Path to `gdal_translate`.
    #[serde(default = "default_gdal_translate")]
    pub gdal_translate_path: PathBuf,

    /// Path to `gdal2tiles.py`.
    #[serde(default = "default_gdal2tiles")]
    pub gdal2tiles_path: PathBuf,

    /// Deadline for a single tool invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Worker processes passed to the tile generator.
    #[serde(default = "default_tile_processes")]
    pub tile_processes: u32,
}

fn default_grib_copy() -> PathBuf {
    PathBuf::from("grib_copy")
}

fn default_gdalbuildvrt() -> PathBuf {
    PathBuf::from("gdalbuildvrt")
}

fn default_gdal_translate() -> PathBuf {
    PathBuf::from("gdal_translate")
}

fn default_gdal2tiles() -> PathBuf {
    PathBuf::from("gdal2tiles.py")
}

fn default_timeout() -> u64 {
    900 // 15 minutes
}

fn default_tile_processes() -> u32 {
    1
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            grib_copy_path: default_grib_copy(),
            gdalbuildvrt_path: default_gdalbuildvrt(),
            gdal_translate_path: default_gdal_translate(),
            gdal2tiles_path: default_gdal2tiles(),
            timeout_secs: default_timeout(),
            tile_processes: default_tile_processes(),
        }
    }
}

impl ToolsConfig {
    /// Points every tool at the same program (useful for tests and wrappers).
    pub fn with_all_programs(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self {
            grib_copy_path: program.clone(),
            gdalbuildvrt_path: program.clone(),
            gdal_translate_path: program.clone(),
            gdal2tiles_path: program,
            ..Default::default()
        }
    }

    /// Sets the invocation deadline in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
