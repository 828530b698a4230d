//! Wall-clock sources.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time
pub trait Clock: Send + Sync + 'static {
    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn epoch_millis(&self) -> i64 {
        self.system_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }

    /// Get whole seconds since UNIX epoch
    fn epoch_secs(&self) -> i64 {
        self.epoch_millis() / 1000
    }
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient cloning
impl<T: Clock> Clock for Arc<T> {
    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the session controller and advance the other.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<SystemTime>>,
}

impl MockClock {
    /// Create a mock clock frozen at the current system time
    pub fn new() -> Self {
        Self { now: Arc::new(Mutex::new(SystemTime::now())) }
    }

    /// Create a mock clock frozen at the given UNIX timestamp (seconds)
    pub fn at_epoch_secs(secs: u64) -> Self {
        Self { now: Arc::new(Mutex::new(UNIX_EPOCH + Duration::from_secs(secs))) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += duration;
        }
    }

    /// Advance the mock clock by seconds (convenience method)
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Set the mock clock to a specific UNIX timestamp (seconds)
    pub fn set_epoch_secs(&self, secs: u64) {
        if let Ok(mut now) = self.now.lock() {
            *now = UNIX_EPOCH + Duration::from_secs(secs);
        }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn system_time(&self) -> SystemTime {
        self.now.lock().map(|now| *now).unwrap_or(UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_starts_at_requested_epoch() {
        let clock = MockClock::at_epoch_secs(1_000);
        assert_eq!(clock.epoch_secs(), 1_000);
        assert_eq!(clock.epoch_millis(), 1_000_000);
    }

    #[test]
    fn mock_clock_clones_share_time() {
        let clock = MockClock::at_epoch_secs(1_000);
        let handle = clock.clone();
        handle.advance_secs(240);
        assert_eq!(clock.epoch_secs(), 1_240);

        handle.set_epoch_secs(5);
        assert_eq!(clock.epoch_millis(), 5_000);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.epoch_secs() > 1_577_836_800);
    }
}
