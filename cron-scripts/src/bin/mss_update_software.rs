//! Install the signed packages published for this recorder

use anyhow::{Context, Result, bail};
use clap::Parser;
use mss_core::software_update::run_software_update;
use mss_core::utils::{success, warning};
use mss_cron::{Production, UpdaterArgs};

/// Fetch the signed update manifest and install its packages
#[derive(Parser, Debug)]
#[command(name = "mss-update-software")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    updater: UpdaterArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.updater.init()?;
    let production = Production::new(&settings);

    let report = run_software_update(&settings, &production.context())
        .context("Software update failed")?;

    if !report.manifest_downloaded {
        warning("Update manifest not available");
    } else if !report.manifest_trusted {
        warning("Update manifest signature rejected");
    }

    for package in &report.installed {
        success(&format!("Installed {package}"));
    }
    for package in &report.skipped {
        warning(&format!("Skipped {package}"));
    }

    if !report.failed.is_empty() {
        bail!("Failed to install: {}", report.failed.join(", "));
    }

    Ok(())
}
