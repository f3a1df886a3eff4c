//! Wall-clock access
//!
//! Token expiry is judged against wall-clock milliseconds, which tests need to
//! move independently of the tokio timer wheel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Clock backed by `SystemTime`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        now_millis()
    }
}

/// Manually driven clock for tests and simulations
///
/// Whole-second helpers sit next to millisecond ones since token claims are
/// expressed in seconds.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(secs: u64) -> Self {
        Self {
            millis: AtomicU64::new(secs * 1000),
        }
    }

    pub fn set(&self, secs: u64) {
        self.millis.store(secs * 1000, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.advance_millis(secs * 1000);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Get current timestamp in milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000_000);
        clock.advance(30);
        assert_eq!(clock.now_millis(), 1_030_000);
        clock.advance_millis(250);
        assert_eq!(clock.now_millis(), 1_030_250);
        clock.set(5);
        assert_eq!(clock.now_millis(), 5_000);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_system_clock_keeps_sub_second_precision() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let now = SystemClock.now_millis();
        assert!(now >= before);
        assert!(now - before < 1_000);
    }
}
