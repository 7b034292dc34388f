//! ecCodes/GDAL process-backed toolkit.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::metrics;

use super::config::ToolsConfig;
use super::error::ToolError;
use super::traits::GeoToolkit;
use super::types::{ComponentSpec, RasterSpec, Tool, ZoomRange};

/// Only the tail of stderr is kept in errors.
const STDERR_TAIL_BYTES: usize = 2048;

/// Toolkit that shells out to `grib_copy` and the GDAL utilities.
pub struct GdalToolkit {
    config: ToolsConfig,
}

impl GdalToolkit {
    /// Creates a new toolkit with the given configuration.
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    /// Creates a toolkit with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ToolsConfig::default())
    }

    fn program(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Extract => &self.config.grib_copy_path,
            Tool::Composite => &self.config.gdalbuildvrt_path,
            Tool::Rasterize | Tool::Convert => &self.config.gdal_translate_path,
            Tool::Tile => &self.config.gdal2tiles_path,
        }
    }

    fn build_extract_args(input: &Path, component: &ComponentSpec, output: &Path) -> Vec<String> {
        vec![
            "-w".to_string(),
            component.selector.clone(),
            input.to_string_lossy().to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn build_composite_args(components: &[PathBuf], crs: &str, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-overwrite".to_string(),
            "-separate".to_string(),
            "-a_srs".to_string(),
            crs.to_string(),
            output.to_string_lossy().to_string(),
        ];
        args.extend(components.iter().map(|p| p.to_string_lossy().to_string()));
        args
    }

    fn build_rasterize_args(composite: &Path, spec: &RasterSpec, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-of".to_string(),
            "GTiff".to_string(),
            "-ot".to_string(),
            "Byte".to_string(),
            "-outsize".to_string(),
            spec.width.to_string(),
            spec.height.to_string(),
            "-scale".to_string(),
            spec.scale_min.to_string(),
            spec.scale_max.to_string(),
            "0".to_string(),
            "255".to_string(),
        ];
        for band in &spec.bands {
            args.extend(["-b".to_string(), band.to_string()]);
        }
        args.push(composite.to_string_lossy().to_string());
        args.push(output.to_string_lossy().to_string());
        args
    }

    fn build_convert_args(raster: &Path, output: &Path) -> Vec<String> {
        vec![
            "-of".to_string(),
            "PNG".to_string(),
            raster.to_string_lossy().to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn build_tile_args(&self, raster: &Path, zoom: ZoomRange, output_dir: &Path) -> Vec<String> {
        vec![
            "--xyz".to_string(),
            "-z".to_string(),
            zoom.to_string(),
            "-w".to_string(),
            "none".to_string(),
            format!("--processes={}", self.config.tile_processes.max(1)),
            raster.to_string_lossy().to_string(),
            output_dir.to_string_lossy().to_string(),
        ]
    }

    /// Runs one tool to completion and checks its declared output.
    async fn run(&self, tool: Tool, args: Vec<String>, output: &Path) -> Result<PathBuf, ToolError> {
        let program = self.program(tool);
        let start = Instant::now();
        debug!(tool = %tool, program = %program.display(), args = ?args, "Running tool");

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        tool,
                        program: program.to_path_buf(),
                    }
                } else {
                    ToolError::Io(e)
                }
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let deadline = Duration::from_secs(self.config.timeout_secs);
        let result = match timeout(deadline, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                metrics::TOOL_INVOCATIONS
                    .with_label_values(&[tool.as_str(), "timeout"])
                    .inc();
                warn!(tool = %tool, timeout_secs = self.config.timeout_secs, "Tool timed out");
                return Err(ToolError::Timeout {
                    tool,
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        metrics::TOOL_DURATION
            .with_label_values(&[tool.as_str()])
            .observe(start.elapsed().as_secs_f64());

        if !result.status.success() {
            metrics::TOOL_INVOCATIONS
                .with_label_values(&[tool.as_str(), "failed"])
                .inc();
            return Err(ToolError::failed(
                tool,
                result.status.code(),
                stderr_tail(&result.stderr),
            ));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            metrics::TOOL_INVOCATIONS
                .with_label_values(&[tool.as_str(), "failed"])
                .inc();
            return Err(ToolError::MissingOutput {
                tool,
                path: output.to_path_buf(),
            });
        }

        metrics::TOOL_INVOCATIONS
            .with_label_values(&[tool.as_str(), "success"])
            .inc();
        debug!(
            tool = %tool,
            duration_ms = start.elapsed().as_millis() as u64,
            output = %output.display(),
            "Tool finished"
        );

        Ok(output.to_path_buf())
    }

    async fn check_version(&self, tool: Tool, version_arg: &str) -> Result<(), ToolError> {
        let program = self.program(tool);
        let result = Command::new(program)
            .arg(version_arg)
            .stdin(Stdio::null())
            .output()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::NotFound {
                tool,
                program: program.to_path_buf(),
            }),
            Err(e) => Err(ToolError::Io(e)),
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    if text.len() <= STDERR_TAIL_BYTES {
        return text.into_owned();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[async_trait]
impl GeoToolkit for GdalToolkit {
    fn name(&self) -> &str {
        "gdal"
    }

    async fn extract_component(
        &self,
        input: &Path,
        component: &ComponentSpec,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        let args = Self::build_extract_args(input, component, output);
        self.run(Tool::Extract, args, output).await
    }

    async fn build_composite(
        &self,
        components: &[PathBuf],
        crs: &str,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        if components.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: Tool::Composite,
                reason: "no component rasters".to_string(),
            });
        }
        let args = Self::build_composite_args(components, crs, output);
        self.run(Tool::Composite, args, output).await
    }

    async fn rasterize(
        &self,
        composite: &Path,
        spec: &RasterSpec,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        let args = Self::build_rasterize_args(composite, spec, output);
        self.run(Tool::Rasterize, args, output).await
    }

    async fn convert_image(&self, raster: &Path, output: &Path) -> Result<PathBuf, ToolError> {
        let args = Self::build_convert_args(raster, output);
        self.run(Tool::Convert, args, output).await
    }

    async fn generate_tiles(
        &self,
        raster: &Path,
        zoom: ZoomRange,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError> {
        if !zoom.is_valid() {
            return Err(ToolError::InvalidArguments {
                tool: Tool::Tile,
                reason: format!("zoom range {} is inverted", zoom),
            });
        }
        let args = self.build_tile_args(raster, zoom, output_dir);
        self.run(Tool::Tile, args, output_dir).await
    }

    async fn validate(&self) -> Result<(), ToolError> {
        self.check_version(Tool::Extract, "-V").await?;
        self.check_version(Tool::Composite, "--version").await?;
        self.check_version(Tool::Rasterize, "--version").await?;
        self.check_version(Tool::Tile, "--version").await?;
        Ok(())
    }
}
