//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Acquisition (downloads by result and duration)
//! - External tool invocations
//! - Pipeline stages, publications and cleanup

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Registry holding every core metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        // Registration only fails on duplicate descriptors, which the static
        // set below never produces.
        let _ = registry.register(metric);
    }
    registry
});

// =============================================================================
// Acquisition
// =============================================================================

/// Downloads total by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("windmap_downloads_total", "Total forecast file downloads"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "windmap_download_duration_seconds",
            "Duration of forecast file downloads",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

/// Bytes downloaded.
pub static DOWNLOAD_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("windmap_download_bytes_total", "Total bytes downloaded").unwrap()
});

// =============================================================================
// External tools
// =============================================================================

/// Tool invocations by tool and result.
pub static TOOL_INVOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "windmap_tool_invocations_total",
            "Total external tool invocations",
        ),
        &["tool", "result"], // result: "success", "failed", "timeout"
    )
    .unwrap()
});

/// Tool invocation duration in seconds.
pub static TOOL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "windmap_tool_duration_seconds",
            "Duration of external tool invocations",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["tool"],
    )
    .unwrap()
});

// =============================================================================
// Pipeline
// =============================================================================

/// Stage outcomes by stage and status.
pub static STAGE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("windmap_stage_outcomes_total", "Pipeline stage outcomes"),
        &["stage", "status"], // status: "succeeded", "failed", "skipped"
    )
    .unwrap()
});

/// Publications by kind and result.
pub static PUBLICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("windmap_publications_total", "Total publication attempts"),
        &["kind", "result"], // kind: "preview", "tiles"
    )
    .unwrap()
});

/// Cleanup failures.
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "windmap_cleanup_failures_total",
        "Scratch files or inputs that could not be deleted",
    )
    .unwrap()
});

/// Per-artifact pipeline duration in seconds.
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "windmap_pipeline_duration_seconds",
            "Duration of a per-artifact pipeline run",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 900.0]),
        &["result"], // "complete", "partial"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Acquisition
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(DOWNLOAD_BYTES.clone()),
        // Tools
        Box::new(TOOL_INVOCATIONS.clone()),
        Box::new(TOOL_DURATION.clone()),
        // Pipeline
        Box::new(STAGE_OUTCOMES.clone()),
        Box::new(PUBLICATIONS_TOTAL.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
        Box::new(PIPELINE_DURATION.clone()),
    ]
}

/// Encodes the registry in the Prometheus text exposition format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
