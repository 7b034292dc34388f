//! Per-artifact processing pipeline.
//!
//! Each downloaded forecast file runs through a fixed chain of states:
//!
//! ```text
//! Downloaded -> Split -> Composite -> Rendered -> [Tiled] -> Published -> Cleaned
//! ```
//!
//! A failed transform short-circuits the remaining transforms. Whatever was
//! produced is still published, and cleanup always runs.

mod config;
mod processor;
mod types;

pub use config::PipelineConfig;
pub use processor::ArtifactPipeline;
pub use types::{
    PipelineOutcome, PipelineStage, PipelineState, PublicationKind, PublicationRecord,
    StageRecord, StageStatus,
};
