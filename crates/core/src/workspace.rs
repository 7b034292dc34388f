//! Scratch directories and downloaded-input ownership.
//!
//! A pipeline acquires its working area and its downloaded input together
//! through [`Workspace::with_working_area`]. Both are removed when the
//! closure finishes, whatever it returned. If the closure panics or the
//! future is dropped, the [`WorkingArea`] guard removes them synchronously.
//!
//! Deletion failures are logged and counted, never returned.

use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics;

/// Errors that can occur while setting up a working area.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to create working area {path}: {source}")]
    CreateArea {
        path: PathBuf,
        /// Whether the owned input was deleted anyway.
        input_removed: bool,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    /// Whether the input handed to the workspace is gone.
    pub fn input_removed(&self) -> bool {
        match self {
            Self::CreateArea { input_removed, .. } => *input_removed,
        }
    }
}

/// What the cleanup step managed to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// The working area no longer exists.
    pub working_area_removed: bool,
    /// The downloaded input no longer exists.
    pub input_removed: bool,
    /// Deletion errors, already logged.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.working_area_removed && self.input_removed
    }
}

/// Root directory holding one working area per in-flight artifact.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a fresh working area for `artifact_id` owning `input`.
    pub async fn create_area(
        &self,
        artifact_id: &str,
        input: impl Into<PathBuf>,
    ) -> Result<WorkingArea, WorkspaceError> {
        let path = self
            .root
            .join(format!("{}-{}", artifact_id, Uuid::new_v4().simple()));
        let input = input.into();

        if let Err(source) = tokio::fs::create_dir_all(&path).await {
            // The input is owned from here on, even if the area never existed.
            let input_removed = remove_input(&input, &mut Vec::new()).await;
            return Err(WorkspaceError::CreateArea {
                path,
                input_removed,
                source,
            });
        }

        debug!(artifact = %artifact_id, path = %path.display(), "Created working area");
        Ok(WorkingArea {
            path,
            input: Some(input),
            released: false,
        })
    }

    /// Runs `f` inside a fresh working area, then removes the area and `input`.
    ///
    /// `f` receives the working area path. Cleanup happens on every exit
    /// path; its outcome is returned alongside `f`'s value.
    pub async fn with_working_area<F, Fut, T>(
        &self,
        artifact_id: &str,
        input: &Path,
        f: F,
    ) -> Result<(T, CleanupReport), WorkspaceError>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = T>,
    {
        let area = self.create_area(artifact_id, input).await?;
        let value = f(area.path().to_path_buf()).await;
        let report = area.release().await;
        Ok((value, report))
    }
}

/// Guard over one working area and the input it owns.
#[derive(Debug)]
pub struct WorkingArea {
    path: PathBuf,
    input: Option<PathBuf>,
    released: bool,
}

impl WorkingArea {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the area and the owned input.
    pub async fn release(mut self) -> CleanupReport {
        self.released = true;
        let mut report = CleanupReport::default();

        report.working_area_removed = match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                metrics::CLEANUP_FAILURES.inc();
                warn!(path = %self.path.display(), error = %e, "Failed to remove working area");
                report
                    .errors
                    .push(format!("{}: {}", self.path.display(), e));
                false
            }
        };

        report.input_removed = match self.input.take() {
            Some(input) => remove_input(&input, &mut report.errors).await,
            None => true,
        };

        debug!(path = %self.path.display(), clean = report.is_clean(), "Released working area");
        report
    }
}

impl Drop for WorkingArea {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(path = %self.path.display(), "Working area dropped without release, cleaning up");
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                metrics::CLEANUP_FAILURES.inc();
                warn!(path = %self.path.display(), error = %e, "Failed to remove working area");
            }
        }
        if let Some(input) = self.input.take() {
            if let Err(e) = std::fs::remove_file(&input) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    metrics::CLEANUP_FAILURES.inc();
                    warn!(path = %input.display(), error = %e, "Failed to delete input");
                }
            }
        }
    }
}

/// Best-effort deletion of a downloaded input. Returns whether it is gone.
pub async fn delete_input(path: &Path) -> bool {
    let mut errors = Vec::new();
    remove_input(path, &mut errors).await
}

async fn remove_input(path: &Path, errors: &mut Vec<String>) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Input already removed");
            true
        }
        Err(e) => {
            metrics::CLEANUP_FAILURES.inc();
            warn!(path = %path.display(), error = %e, "Failed to delete input");
            errors.push(format!("{}: {}", path.display(), e));
            false
        }
    }
}
