use rand::Rng;
use std::time::Duration;

/// Uniformly random delay in whole seconds, `0..=max_secs`
pub fn random_delay(max_secs: u64) -> Duration {
    Duration::from_secs(rand::rng().random_range(0..=max_secs))
}

/// Sleep for a random delay so a fleet of devices does not hit the update
/// server in the same second
pub fn sleep_random(max_secs: u64) {
    let delay = random_delay(max_secs);
    log::debug!("Waiting {}s before contacting the update server", delay.as_secs());
    std::thread::sleep(delay);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_stays_in_range() {
        for _ in 0..200 {
            assert!(random_delay(60) <= Duration::from_secs(60));
        }
        assert_eq!(random_delay(0), Duration::ZERO);
    }
}
