//! Delete recordings older than their retention window

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use mss_core::retention;
use mss_cron::CommonArgs;

/// Delete files past their retention age from the configured directories
#[derive(Parser, Debug)]
#[command(name = "mss-file-cleanup")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.common.init()?;

    let removed = retention::sweep(&settings.retention, Utc::now())
        .context("Retention sweep failed")?;
    log::info!("Removed {} file(s)", removed.len());

    Ok(())
}
