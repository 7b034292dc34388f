//! Command line arguments.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Fetch, render and publish one wind forecast release.
#[derive(Debug, Parser)]
#[command(name = "windmap", version)]
pub struct Args {
    /// Release hour to process (00 or 12). Defaults to the latest published release.
    pub release: Option<String>,

    /// Release date (YYYY-MM-DD). Defaults to today, UTC.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Path to a TOML config file.
    #[arg(long, env = "WINDMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "WINDMAP_LOG_JSON")]
    pub log_json: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub report_json: bool,

    /// Check that the external tools are installed, then exit.
    #[arg(long)]
    pub check_tools: bool,
}
