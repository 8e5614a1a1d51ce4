//! Apply the signed remote dali configuration

use anyhow::{Context, Result};
use clap::Parser;
use mss_core::config_update::{ConfigUpdateOutcome, run_config_update};
use mss_core::utils::{info, warning};
use mss_cron::{Production, UpdaterArgs};

/// Fetch the signed dali config and apply it to dali.ini
#[derive(Parser, Debug)]
#[command(name = "mss-update-config")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    updater: UpdaterArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.updater.init()?;
    let production = Production::new(&settings);

    let outcome = run_config_update(&settings, &production.context())
        .context("Config update failed")?;

    match outcome {
        ConfigUpdateOutcome::NotDownloaded => warning("Remote config not available"),
        ConfigUpdateOutcome::Untrusted => warning("Remote config signature rejected"),
        ConfigUpdateOutcome::Unchanged => info("dali.ini is up to date"),
        ConfigUpdateOutcome::Updated => {}
    }

    Ok(())
}
