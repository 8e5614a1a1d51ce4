use crate::debounce::Debouncer;
use crate::error::{ButtonResult, Error};
use crossbeam_channel::Receiver;
use linux_embedded_hal::gpio_cdev::{
    Chip, EventRequestFlags, LineEventHandle, LineRequestFlags,
};
use log::info;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

const DEFAULT_GPIO_CHIP_PATH: &str = "/dev/gpiochip0";
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);
const BUTTON_CONSUMER: &str = "mss-button";

/// How often the watcher checks whether it should stop
const POLL_INTERVAL_MS: libc::c_int = 200;

/// BCM pin of the push button for a PCB hardware revision
pub fn pin_for_revision(revision: u32) -> Option<u32> {
    match revision {
        1 => Some(26),
        2 => Some(4),
        _ => None,
    }
}

#[derive(Default)]
pub struct ButtonConfig {
    pub gpio_chip_path: Option<String>,
    /// No default, the pin depends on the PCB revision
    pub pin: Option<u32>,
    pub debounce: Option<Duration>,
}

/// A debounced button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    pub pin: u32,
    /// Kernel event timestamp in nanoseconds
    pub timestamp_ns: u64,
}

/// Falling-edge watch on one GPIO line
///
/// The line is requested for as long as the `Button` lives. Dropping it stops
/// the watcher thread and hands the line back to the kernel.
pub struct Button {
    pin: u32,
    stop: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
}

impl Button {
    pub fn new(config: ButtonConfig) -> ButtonResult<(Self, Receiver<Press>)> {
        let pin = config.pin.ok_or(Error::NoPin)?;
        let gpio_chip_path = config
            .gpio_chip_path
            .unwrap_or_else(|| DEFAULT_GPIO_CHIP_PATH.to_string());
        let debounce = config.debounce.unwrap_or(DEFAULT_DEBOUNCE);

        info!("Arming button on {gpio_chip_path} line {pin}");

        let mut chip = Chip::new(gpio_chip_path)?;
        let events = chip.get_line(pin)?.events(
            LineRequestFlags::INPUT,
            EventRequestFlags::FALLING_EDGE,
            BUTTON_CONSUMER,
        )?;

        let (press_tx, press_rx) = crossbeam_channel::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_watcher = Arc::clone(&stop);

        let watcher = std::thread::spawn(move || {
            let mut debouncer = Debouncer::new(debounce);
            watch(events, &stop_watcher, |timestamp_ns| {
                if debouncer.accept(timestamp_ns) {
                    press_tx.send(Press { pin, timestamp_ns }).is_ok()
                } else {
                    log::debug!("Ignoring bounce on line {pin}");
                    true
                }
            });
            log::debug!("Released GPIO line {pin}");
        });

        let button = Self {
            pin,
            stop,
            watcher: Some(watcher),
        };

        Ok((button, press_rx))
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }
}

impl Drop for Button {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(watcher) = self.watcher.take()
            && watcher.join().is_err()
        {
            log::error!("Button watcher on line {} panicked", self.pin);
        }
    }
}

/// Wait until the line event fd is readable or the poll interval elapsed
fn wait_readable(events: &LineEventHandle) -> std::io::Result<bool> {
    let mut fd = libc::pollfd {
        fd: events.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: `fd` is a valid pollfd for the duration of the call and the
    // descriptor is kept open by `events`
    let ret = unsafe { libc::poll(&mut fd, 1, POLL_INTERVAL_MS) };
    if ret < 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(ret > 0 && fd.revents & libc::POLLIN != 0)
}

/// Forward edge timestamps to `on_edge` until stopped, the receiver side is
/// gone (`on_edge` returns false) or the line fails
fn watch(
    mut events: LineEventHandle,
    stop: &AtomicBool,
    mut on_edge: impl FnMut(u64) -> bool,
) {
    while !stop.load(Ordering::Relaxed) {
        match wait_readable(&events) {
            Ok(false) => {}
            Ok(true) => match events.get_event() {
                Ok(event) => {
                    if !on_edge(event.timestamp()) {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Error reading button event: {e}");
                    break;
                }
            },
            Err(e) => {
                log::error!("Error waiting for button event: {e}");
                break;
            }
        }
    }
}
