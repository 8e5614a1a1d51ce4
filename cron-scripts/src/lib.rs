//! Command line plumbing shared by the cron and GPIO triggered tools

use anyhow::{Context, Result};
use clap::Args;
use mss_core::MssSettings;
use mss_core::fetch::HttpFetcher;
use mss_core::jitter::sleep_random;
use mss_core::signature::GpgVerifier;
use mss_core::system::SudoSystem;
use std::path::PathBuf;

fn init_logging(verbose: bool) {
    let log_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();
}

/// Options every tool accepts
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// JSON file overriding the built-in paths, URLs and service names
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Display detailed diagnostic information
    #[arg(long, short)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Initialise logging and load the settings
    pub fn init(&self) -> Result<MssSettings> {
        init_logging(self.verbose);
        MssSettings::load(self.settings.as_deref()).context("Failed to load settings")
    }
}

/// Options of the two updaters
#[derive(Args, Debug)]
pub struct UpdaterArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Start immediately instead of after a random delay
    #[arg(long)]
    pub no_jitter: bool,
}

impl UpdaterArgs {
    /// Initialise logging, load the settings and wait out the start jitter
    pub fn init(&self) -> Result<MssSettings> {
        let settings = self.common.init()?;
        if !self.no_jitter {
            sleep_random(settings.jitter_max_secs);
        }
        Ok(settings)
    }
}

/// Production collaborators of the updaters
pub struct Production {
    pub fetcher: HttpFetcher,
    pub verifier: GpgVerifier,
    pub system: SudoSystem,
}

impl Production {
    pub fn new(settings: &MssSettings) -> Self {
        Self {
            fetcher: HttpFetcher::new(settings.http_timeout_secs),
            verifier: GpgVerifier,
            system: SudoSystem,
        }
    }

    pub fn context(&self) -> mss_core::UpdateContext<'_> {
        mss_core::UpdateContext {
            fetcher: &self.fetcher,
            verifier: &self.verifier,
            system: &self.system,
        }
    }
}
