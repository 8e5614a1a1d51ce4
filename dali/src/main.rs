//! Replace this process with the miniSEED forwarding daemon

use anyhow::{Context, Result};
use clap::Parser;
use mss_core::MssSettings;
use mss_core::device_config::DaliConfig;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Start mseedscan2dali with the server and data directory of a dali INI file
#[derive(Parser, Debug)]
#[command(name = "mss-start-dali")]
#[command(version, about, long_about = None)]
struct Cli {
    /// dali INI file with the [dali] host, port and mseed_dir keys
    config_file: PathBuf,

    /// JSON file overriding the daemon binary and scan interval
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Display detailed diagnostic information
    #[arg(long, short)]
    verbose: bool,
}

fn daemon_command(binary: &Path, scan_interval_secs: u32, dali: &DaliConfig) -> Command {
    let mut command = Command::new(binary);
    command
        .arg("-s")
        .arg(scan_interval_secs.to_string())
        .arg("-d")
        .arg(&dali.mseed_dir)
        .arg(dali.server_address());
    command
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let settings = MssSettings::load(cli.settings.as_deref()).context("Failed to load settings")?;

    let dali = DaliConfig::load(&cli.config_file)
        .with_context(|| format!("Failed to read {}", cli.config_file.display()))?;

    let mut command = daemon_command(&settings.dali_binary, settings.dali_scan_interval_secs, &dali);
    log::info!(
        "Starting {} for {} from {}",
        settings.dali_binary.display(),
        dali.server_address(),
        dali.mseed_dir.display()
    );

    // exec only returns on failure
    let err = command.exec();
    Err(err).with_context(|| format!("Failed to exec {}", settings.dali_binary.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_daemon_arguments() {
        let dali = DaliConfig {
            host: "1.2.3.4".to_string(),
            port: 16000,
            mseed_dir: PathBuf::from("/home/mss/mseed"),
        };
        let command = daemon_command(Path::new("/usr/bin/mseedscan2dali"), 5, &dali);

        assert_eq!(command.get_program(), OsStr::new("/usr/bin/mseedscan2dali"));
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(
            args,
            ["-s", "5", "-d", "/home/mss/mseed", "1.2.3.4:16000"].map(OsStr::new)
        );
    }

    #[test]
    fn test_config_file_is_required() {
        assert!(Cli::try_parse_from(["mss-start-dali"]).is_err());
        let cli = Cli::try_parse_from(["mss-start-dali", "/home/mss/config/dali.ini"]).unwrap();
        assert_eq!(cli.config_file, PathBuf::from("/home/mss/config/dali.ini"));
    }
}
