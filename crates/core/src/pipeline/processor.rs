//! Artifact pipeline implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::acquisition::DownloadedArtifact;
use crate::metrics;
use crate::publisher::{PublicationKey, PublishError, PublishedObject, Publisher};
use crate::tools::{GeoToolkit, Tool, ToolError};
use crate::workspace::{CleanupReport, Workspace};

use super::config::PipelineConfig;
use super::types::{
    PipelineOutcome, PipelineStage, PipelineState, PublicationKind, PublicationRecord,
    StageRecord, StageStatus,
};

const COMPOSITE_FILE: &str = "wind.vrt";
const RASTER_FILE: &str = "wind_data.tif";
const TILES_DIR: &str = "tiles";

/// Outputs produced so far inside one working area.
#[derive(Debug, Default)]
struct Products {
    components: Vec<PathBuf>,
    composite: Option<PathBuf>,
    raster: Option<PathBuf>,
    preview: Option<PathBuf>,
    tiles: Option<PathBuf>,
}

/// Mutable state of one pipeline run.
struct Run {
    artifact_id: String,
    input: PathBuf,
    area: PathBuf,
    products: Products,
    stages: Vec<StageRecord>,
}

impl Run {
    fn new(artifact: &DownloadedArtifact, area: PathBuf) -> Self {
        Self {
            artifact_id: artifact.id(),
            input: artifact.path.clone(),
            area,
            products: Products::default(),
            stages: Vec::new(),
        }
    }

    fn record(&mut self, stage: PipelineStage, start: Instant, error: Option<&ToolError>) {
        let status = match error {
            None => StageStatus::Succeeded,
            Some(e) => {
                warn!(
                    artifact = %self.artifact_id,
                    stage = %stage,
                    error = %e,
                    "Pipeline stage failed"
                );
                StageStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        metrics::STAGE_OUTCOMES
            .with_label_values(&[stage.as_str(), status.label()])
            .inc();
        self.stages.push(StageRecord {
            stage,
            status,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }

    /// Stage records in pipeline order, unattempted stages marked skipped.
    fn finish(mut self) -> (Vec<StageRecord>, Products) {
        let records = PipelineStage::ALL
            .iter()
            .map(|stage| {
                match self.stages.iter().position(|r| r.stage == *stage) {
                    Some(index) => self.stages.swap_remove(index),
                    None => {
                        metrics::STAGE_OUTCOMES
                            .with_label_values(&[stage.as_str(), StageStatus::Skipped.label()])
                            .inc();
                        StageRecord {
                            stage: *stage,
                            status: StageStatus::Skipped,
                            duration_ms: 0,
                        }
                    }
                }
            })
            .collect();
        (records, self.products)
    }
}

/// Drives downloaded artifacts through extraction, rendering and publication.
///
/// Instances hold no per-artifact state, so one pipeline can process many
/// artifacts concurrently.
pub struct ArtifactPipeline<T: GeoToolkit, P: Publisher> {
    config: PipelineConfig,
    workspace: Workspace,
    toolkit: Arc<T>,
    publisher: Arc<P>,
}

impl<T: GeoToolkit, P: Publisher> ArtifactPipeline<T, P> {
    /// Creates a new pipeline.
    pub fn new(config: PipelineConfig, toolkit: T, publisher: P) -> Self {
        Self::with_shared(config, Arc::new(toolkit), Arc::new(publisher))
    }

    /// Creates a pipeline over shared collaborators.
    pub fn with_shared(config: PipelineConfig, toolkit: Arc<T>, publisher: Arc<P>) -> Self {
        let workspace = Workspace::new(config.work_dir());
        Self {
            config,
            workspace,
            toolkit,
            publisher,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes every artifact concurrently, one outcome per artifact.
    pub async fn process_all(&self, artifacts: Vec<DownloadedArtifact>) -> Vec<PipelineOutcome> {
        futures::future::join_all(artifacts.into_iter().map(|a| self.process(a))).await
    }

    /// Processes one artifact. Never fails: every problem ends up in the outcome.
    pub async fn process(&self, artifact: DownloadedArtifact) -> PipelineOutcome {
        let start = Instant::now();
        let artifact_id = artifact.id();
        info!(
            artifact = %artifact_id,
            forecast = %artifact.forecast_timestamp,
            "Processing artifact"
        );

        let result = self
            .workspace
            .with_working_area(&artifact_id, &artifact.path, |area| {
                self.run(&artifact, area)
            })
            .await;

        let (reached, stages, publications, cleanup) = match result {
            Ok(((reached, stages, publications), cleanup)) => {
                (reached, stages, publications, cleanup)
            }
            Err(e) => {
                warn!(artifact = %artifact_id, error = %e, "Could not set up working area");
                let stages = PipelineStage::ALL
                    .iter()
                    .map(|stage| StageRecord {
                        stage: *stage,
                        status: if *stage == PipelineStage::Split {
                            StageStatus::Failed {
                                error: e.to_string(),
                            }
                        } else {
                            StageStatus::Skipped
                        },
                        duration_ms: 0,
                    })
                    .collect();
                let cleanup = CleanupReport {
                    working_area_removed: true,
                    input_removed: e.input_removed(),
                    errors: Vec::new(),
                };
                (PipelineState::Downloaded, stages, Vec::new(), cleanup)
            }
        };

        debug!(artifact = %artifact_id, state = %PipelineState::Cleaned, "Pipeline transition");

        let outcome = PipelineOutcome {
            artifact_id,
            forecast_timestamp: artifact.forecast_timestamp,
            reached,
            stages,
            publications,
            cleanup,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let result_label = if outcome.is_complete() {
            "complete"
        } else {
            "partial"
        };
        metrics::PIPELINE_DURATION
            .with_label_values(&[result_label])
            .observe(start.elapsed().as_secs_f64());

        info!(
            artifact = %outcome.artifact_id,
            reached = %outcome.reached,
            published = outcome.published_keys().len(),
            complete = outcome.is_complete(),
            duration_ms = outcome.duration_ms,
            "Artifact processed"
        );

        outcome
    }

    /// Transforms then publishes inside the working area.
    async fn run(
        &self,
        artifact: &DownloadedArtifact,
        area: PathBuf,
    ) -> (PipelineState, Vec<StageRecord>, Vec<PublicationRecord>) {
        let mut run = Run::new(artifact, area);
        let mut state = PipelineState::Downloaded;

        while let Some(next) = self.advance(state, &mut run).await {
            debug!(artifact = %run.artifact_id, from = %state, to = %next, "Pipeline transition");
            state = next;
        }

        let (stages, products) = run.finish();
        let publications = self.publish(artifact, &products).await;
        debug!(
            artifact = %artifact.id(),
            state = %PipelineState::Published,
            "Pipeline transition"
        );

        (state, stages, publications)
    }

    /// Runs the transform leaving `state`; `None` ends the transform chain.
    async fn advance(&self, state: PipelineState, run: &mut Run) -> Option<PipelineState> {
        match state {
            PipelineState::Downloaded => self.split(run).await.then_some(PipelineState::Split),
            PipelineState::Split => self
                .composite(run)
                .await
                .then_some(PipelineState::Composite),
            PipelineState::Composite => self.render(run).await.then_some(PipelineState::Rendered),
            PipelineState::Rendered if self.config.generate_tiles => {
                self.tile(run).await.then_some(PipelineState::Tiled)
            }
            PipelineState::Rendered
            | PipelineState::Tiled
            | PipelineState::Published
            | PipelineState::Cleaned => None,
        }
    }

    async fn split(&self, run: &mut Run) -> bool {
        let start = Instant::now();
        let mut outputs = Vec::with_capacity(self.config.components.len());
        let mut error = None;

        if self.config.components.is_empty() {
            error = Some(ToolError::InvalidArguments {
                tool: Tool::Extract,
                reason: "no wind components configured".to_string(),
            });
        }

        for component in &self.config.components {
            let output = run.area.join(component.file_name());
            match self
                .toolkit
                .extract_component(&run.input, component, &output)
                .await
            {
                Ok(path) => outputs.push(path),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        run.record(PipelineStage::Split, start, error.as_ref());
        if error.is_some() {
            return false;
        }
        run.products.components = outputs;
        true
    }

    async fn composite(&self, run: &mut Run) -> bool {
        let start = Instant::now();
        let result = self
            .toolkit
            .build_composite(
                &run.products.components,
                &self.config.crs,
                &run.area.join(COMPOSITE_FILE),
            )
            .await;
        run.record(PipelineStage::Composite, start, result.as_ref().err());
        run.products.composite = result.ok();
        run.products.composite.is_some()
    }

    /// Renders the raster, then the preview from it.
    ///
    /// Advances when the raster exists, even if the preview failed.
    async fn render(&self, run: &mut Run) -> bool {
        let Some(composite) = run.products.composite.clone() else {
            return false;
        };

        let start = Instant::now();
        let raster = self
            .toolkit
            .rasterize(&composite, &self.config.raster, &run.area.join(RASTER_FILE))
            .await;
        run.record(PipelineStage::Raster, start, raster.as_ref().err());
        let Ok(raster) = raster else {
            return false;
        };
        run.products.raster = Some(raster.clone());

        let start = Instant::now();
        let preview = self
            .toolkit
            .convert_image(&raster, &run.area.join(&self.config.preview_name))
            .await;
        run.record(PipelineStage::Preview, start, preview.as_ref().err());
        run.products.preview = preview.ok();

        true
    }

    async fn tile(&self, run: &mut Run) -> bool {
        let Some(raster) = run.products.raster.clone() else {
            return false;
        };

        let start = Instant::now();
        let result = self
            .toolkit
            .generate_tiles(&raster, self.config.zoom, &run.area.join(TILES_DIR))
            .await;
        run.record(PipelineStage::Tiles, start, result.as_ref().err());
        run.products.tiles = result.ok();
        run.products.tiles.is_some()
    }

    /// Publishes whatever was produced. Each attempt is recorded separately.
    async fn publish(
        &self,
        artifact: &DownloadedArtifact,
        products: &Products,
    ) -> Vec<PublicationRecord> {
        let artifact_id = artifact.id();
        let mut records = Vec::new();

        if let Some(preview) = &products.preview {
            let keys = PublicationKey::replicated(
                artifact.forecast_timestamp,
                self.config.replicate_hours,
                &self.config.preview_name,
            );
            let results = futures::future::join_all(keys.iter().map(|key| async move {
                let key = key.to_string();
                let result = self.publisher.publish_image(preview, &key).await;
                (key, result.map(|object| vec![object]))
            }))
            .await;
            for (key, result) in results {
                records.push(publication_record(
                    &artifact_id,
                    PublicationKind::Preview,
                    key,
                    result,
                ));
            }
        }

        if let Some(tiles) = &products.tiles {
            let prefix = PublicationKey::prefix_for(artifact.forecast_timestamp);
            let result = self.publisher.publish_directory(tiles, &prefix).await;
            records.push(publication_record(
                &artifact_id,
                PublicationKind::Tiles,
                prefix,
                result,
            ));
        }

        records
    }
}

fn publication_record(
    artifact_id: &str,
    kind: PublicationKind,
    key: String,
    result: Result<Vec<PublishedObject>, PublishError>,
) -> PublicationRecord {
    match result {
        Ok(objects) => {
            metrics::PUBLICATIONS_TOTAL
                .with_label_values(&[kind.as_str(), "success"])
                .inc();
            info!(
                artifact = %artifact_id,
                kind = kind.as_str(),
                key = %key,
                objects = objects.len(),
                "Published"
            );
            PublicationRecord {
                kind,
                key,
                objects,
                error: None,
            }
        }
        Err(e) => {
            metrics::PUBLICATIONS_TOTAL
                .with_label_values(&[kind.as_str(), "failed"])
                .inc();
            warn!(
                artifact = %artifact_id,
                kind = kind.as_str(),
                key = %key,
                error = %e,
                "Publication failed"
            );
            PublicationRecord {
                kind,
                key,
                objects: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}
