mod args;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use windmap_core::{
    load_config, metrics, GdalToolkit, GeoToolkit, ProductionRunner, RunError, RunRequest,
    SanitizedConfig,
};

use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_json);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            let code = e
                .downcast_ref::<RunError>()
                .map(RunError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())
        .map_err(RunError::from)
        .context("Failed to load configuration")?;

    debug!(
        config = %serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default(),
        "Configuration loaded"
    );

    if args.check_tools {
        let toolkit = GdalToolkit::new(config.tools.clone());
        toolkit
            .validate()
            .await
            .context("External tool check failed")?;
        info!("All external tools are available");
        return Ok(());
    }

    let runner = ProductionRunner::from_config(&config)?;

    let mut request = RunRequest::at(Utc::now());
    if let Some(release) = args.release {
        request = request.with_release(release);
    }
    if let Some(date) = args.date {
        request = request.with_date(date);
    }

    let result = runner.run(request).await;

    if let Some(path) = &config.metrics.textfile {
        if let Err(e) = write_metrics(path).await {
            warn!(path = %path.display(), error = %e, "Failed to write metrics textfile");
        }
    }

    let report = result?;
    if args.report_json {
        let json = serde_json::to_string_pretty(&report).context("Failed to encode run report")?;
        println!("{}", json);
    }

    if !report.is_complete() {
        warn!(
            release = %report.release,
            failed_downloads = report.download_failures.len(),
            incomplete = report.outcomes.len() - report.complete_count(),
            "Run finished with per-file failures"
        );
    }

    Ok(())
}

/// Writes the metrics exposition next to `path`, then renames it into place
/// so the textfile collector never reads a partial file.
async fn write_metrics(path: &Path) -> Result<()> {
    let body = metrics::encode_metrics().context("Failed to encode metrics")?;
    let tmp = path.with_extension("prom.tmp");
    tokio::fs::write(&tmp, body)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move metrics into {}", path.display()))?;
    Ok(())
}
