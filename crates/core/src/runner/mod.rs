//! One end-to-end run: pick a release, fetch it, process every file.
//!
//! The runner wires the [`Acquirer`](crate::acquisition::Acquirer) to the
//! [`ArtifactPipeline`](crate::pipeline::ArtifactPipeline). Only failures that
//! make the whole run meaningless surface as [`RunError`]; everything that
//! happens to individual files is reported in the [`RunReport`].

mod run;
mod types;

pub use run::{ProductionRunner, Runner};
pub use types::{FailedDownload, RunError, RunReport, RunRequest};
