//! Mock geospatial toolkit for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tools::{ComponentSpec, GeoToolkit, RasterSpec, Tool, ToolError, ZoomRange};

/// Tiles written by a successful mock tile run, relative to the output dir.
const MOCK_TILES: [&str; 3] = ["0/0/0.png", "1/0/1.png", "1/1/1.png"];

/// Mock implementation of the GeoToolkit trait.
///
/// Successful calls create their declared output (a small file, or a tile
/// tree for [`Tool::Tile`]) so downstream stages and cleanup see real files.
///
/// # Example
///
/// ```rust,ignore
/// use windmap_core::testing::MockToolkit;
/// use windmap_core::tools::Tool;
///
/// let toolkit = MockToolkit::new();
/// toolkit.fail_at(Tool::Rasterize).await;
///
/// // ... run a pipeline ...
///
/// assert_eq!(toolkit.invocations().await.last(), Some(&Tool::Rasterize));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockToolkit {
    /// Every tool invoked, in order.
    invocations: Arc<RwLock<Vec<Tool>>>,
    /// Tools that exit non-zero.
    failing: Arc<RwLock<HashSet<Tool>>>,
    /// Tools that exit zero without writing their output.
    omitting: Arc<RwLock<HashSet<Tool>>>,
    /// Fail when an input file does not exist.
    require_inputs: Arc<RwLock<bool>>,
}

impl MockToolkit {
    /// Create a new mock toolkit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `tool` exit with status 1.
    pub async fn fail_at(&self, tool: Tool) {
        self.failing.write().await.insert(tool);
    }

    /// Make `tool` succeed without producing its declared output.
    pub async fn omit_output(&self, tool: Tool) {
        self.omitting.write().await.insert(tool);
    }

    /// Check that inputs exist before "running".
    pub async fn require_existing_inputs(&self) {
        *self.require_inputs.write().await = true;
    }

    /// Get all invoked tools, in order.
    pub async fn invocations(&self) -> Vec<Tool> {
        self.invocations.read().await.clone()
    }

    /// Number of times `tool` was invoked.
    pub async fn invocation_count(&self, tool: Tool) -> usize {
        self.invocations
            .read()
            .await
            .iter()
            .filter(|t| **t == tool)
            .count()
    }

    async fn invoke(
        &self,
        tool: Tool,
        inputs: &[&Path],
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.invocations.write().await.push(tool);

        if *self.require_inputs.read().await {
            if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
                return Err(ToolError::failed(
                    tool,
                    Some(1),
                    format!("cannot open {}", missing.display()),
                ));
            }
        }

        if self.failing.read().await.contains(&tool) {
            return Err(ToolError::failed(tool, Some(1), "mock failure"));
        }

        if self.omitting.read().await.contains(&tool) {
            return Err(ToolError::MissingOutput {
                tool,
                path: output.to_path_buf(),
            });
        }

        if tool == Tool::Tile {
            for tile in MOCK_TILES {
                let path = output.join(tile);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, tile.as_bytes()).await?;
            }
        } else {
            tokio::fs::write(output, tool.as_str().as_bytes()).await?;
        }

        Ok(output.to_path_buf())
    }
}

#[async_trait]
impl GeoToolkit for MockToolkit {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract_component(
        &self,
        input: &Path,
        _component: &ComponentSpec,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.invoke(Tool::Extract, &[input], output).await
    }

    async fn build_composite(
        &self,
        components: &[PathBuf],
        _crs: &str,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        let inputs: Vec<&Path> = components.iter().map(|p| p.as_path()).collect();
        self.invoke(Tool::Composite, &inputs, output).await
    }

    async fn rasterize(
        &self,
        composite: &Path,
        _spec: &RasterSpec,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.invoke(Tool::Rasterize, &[composite], output).await
    }

    async fn convert_image(&self, raster: &Path, output: &Path) -> Result<PathBuf, ToolError> {
        self.invoke(Tool::Convert, &[raster], output).await
    }

    async fn generate_tiles(
        &self,
        raster: &Path,
        _zoom: ZoomRange,
        output_dir: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.invoke(Tool::Tile, &[raster], output_dir).await
    }

    async fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}
