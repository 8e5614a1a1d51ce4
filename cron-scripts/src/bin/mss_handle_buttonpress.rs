//! Start the configuration hotspot when the user button is pressed

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossbeam_channel::select;
use mss_button::{Button, ButtonConfig, pin_for_revision};
use mss_core::device_config::read_pcb_version;
use mss_core::system::{SudoSystem, SystemControl};
use mss_cron::CommonArgs;
use std::time::Duration;

/// Watch the push button and start the hotspot service on every press
#[derive(Parser, Debug)]
#[command(name = "mss-handle-buttonpress")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.common.init()?;

    let revision = read_pcb_version(&settings.record_ini)
        .context("Failed to read the PCB version")?;
    let Some(pin) = pin_for_revision(revision) else {
        bail!("No button pin known for PCB version {revision}");
    };

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("Failed to install the signal handler")?;

    let (button, presses) = Button::new(ButtonConfig {
        gpio_chip_path: Some(settings.gpio_chip.display().to_string()),
        pin: Some(pin),
        debounce: Some(Duration::from_millis(settings.button_debounce_ms)),
    })
    .context("Failed to arm the button")?;
    log::info!("Waiting for presses on GPIO {pin} (PCB version {revision})");

    let system = SudoSystem;
    loop {
        select! {
            recv(presses) -> press => {
                let Ok(press) = press else {
                    bail!("Button watcher stopped");
                };
                log::info!("Button pressed on GPIO {}", press.pin);
                match system.start_service(&settings.hotspot_service) {
                    Ok(()) => log::info!("Started {}", settings.hotspot_service),
                    Err(e) => log::error!("Failed to start {}: {e}", settings.hotspot_service),
                }
            }
            recv(shutdown_rx) -> _ => break,
        }
    }

    drop(button);
    log::info!("Released GPIO {pin}");

    Ok(())
}
