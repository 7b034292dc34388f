//! Types for the pipeline module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::publisher::PublishedObject;
use crate::workspace::CleanupReport;

/// States an artifact passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Downloaded,
    Split,
    Composite,
    Rendered,
    Tiled,
    Published,
    Cleaned,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Downloaded => "downloaded",
            PipelineState::Split => "split",
            PipelineState::Composite => "composite",
            PipelineState::Rendered => "rendered",
            PipelineState::Tiled => "tiled",
            PipelineState::Published => "published",
            PipelineState::Cleaned => "cleaned",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transform stages that produce an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Component extraction.
    Split,
    /// Multi-band composite description.
    Composite,
    /// Byte-quantised raster.
    Raster,
    /// PNG preview converted from the raster.
    Preview,
    /// Tile pyramid rendered from the raster.
    Tiles,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::Split,
        PipelineStage::Composite,
        PipelineStage::Raster,
        PipelineStage::Preview,
        PipelineStage::Tiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Split => "split",
            PipelineStage::Composite => "composite",
            PipelineStage::Raster => "raster",
            PipelineStage::Preview => "preview",
            PipelineStage::Tiles => "tiles",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed { error: String },
    /// Not attempted: a predecessor failed or the stage is disabled.
    Skipped,
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Succeeded => "succeeded",
            StageStatus::Failed { .. } => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: PipelineStage,
    #[serde(flatten)]
    pub status: StageStatus,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationKind {
    Preview,
    Tiles,
}

impl PublicationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationKind::Preview => "preview",
            PublicationKind::Tiles => "tiles",
        }
    }
}

/// One publication attempt (a preview slot or a tile directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationRecord {
    pub kind: PublicationKind,
    /// Object key or key prefix.
    pub key: String,
    /// Objects written, empty on failure.
    pub objects: Vec<PublishedObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublicationRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What happened to one artifact.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub artifact_id: String,
    pub forecast_timestamp: DateTime<Utc>,
    /// Furthest transform state reached.
    pub reached: PipelineState,
    /// One record per stage, in [`PipelineStage::ALL`] order.
    pub stages: Vec<StageRecord>,
    pub publications: Vec<PublicationRecord>,
    pub cleanup: CleanupReport,
    pub duration_ms: u64,
}

impl PipelineOutcome {
    pub fn status(&self, stage: PipelineStage) -> Option<&StageStatus> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.status)
    }

    pub fn succeeded(&self, stage: PipelineStage) -> bool {
        matches!(self.status(stage), Some(StageStatus::Succeeded))
    }

    /// The stage that failed, if any.
    pub fn failed_stage(&self) -> Option<PipelineStage> {
        self.stages
            .iter()
            .find(|r| matches!(r.status, StageStatus::Failed { .. }))
            .map(|r| r.stage)
    }

    /// Keys successfully written, in publication order.
    pub fn published_keys(&self) -> Vec<&str> {
        self.publications
            .iter()
            .flat_map(|p| p.objects.iter().map(|o| o.key.as_str()))
            .collect()
    }

    /// No stage and no publication failed.
    pub fn is_complete(&self) -> bool {
        self.failed_stage().is_none() && self.publications.iter().all(|p| p.succeeded())
    }
}
