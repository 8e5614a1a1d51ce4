use std::time::Duration;

/// Drops edges that follow an accepted edge within the debounce window
///
/// Works on the kernel event timestamps (nanoseconds), so the decision does
/// not depend on how quickly the watcher thread gets scheduled.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ns: u64,
    last_accepted: Option<u64>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ns: u64::try_from(window.as_nanos()).unwrap_or(u64::MAX),
            last_accepted: None,
        }
    }

    /// Returns true when the edge at `timestamp_ns` counts as a press
    pub fn accept(&mut self, timestamp_ns: u64) -> bool {
        match self.last_accepted {
            Some(last) if timestamp_ns.saturating_sub(last) < self.window_ns => false,
            _ => {
                self.last_accepted = Some(timestamp_ns);
                true
            }
        }
    }
}
