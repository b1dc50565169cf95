//! Injectable time source.
//!
//! Event records are stamped exactly once, at append time, through this
//! trait. The reducer itself never reads a clock — replay certification
//! depends on that.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanosecond timestamp source.
pub trait Clock: Send + Sync {
    /// Returns the current time in nanoseconds since the Unix epoch.
    fn now_ns(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    // Timestamps won't overflow u64 until the year 2554.
    #[allow(clippy::cast_possible_truncation)]
    fn now_ns(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests: starts at a fixed instant and advances
/// by a fixed step per reading, so successive events get distinct,
/// reproducible timestamps.
#[derive(Debug)]
pub struct FixedClock {
    next: AtomicU64,
    step: u64,
}

impl FixedClock {
    /// Creates a clock whose first reading is `start_ns`, advancing by
    /// `step_ns` per reading.
    #[must_use]
    pub const fn new(start_ns: u64, step_ns: u64) -> Self {
        Self {
            next: AtomicU64::new(start_ns),
            step: step_ns,
        }
    }
}

impl Clock for FixedClock {
    fn now_ns(&self) -> u64 {
        self.next.fetch_add(self.step, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances_deterministically() {
        let clock = FixedClock::new(1_000, 10);
        assert_eq!(clock.now_ns(), 1_000);
        assert_eq!(clock.now_ns(), 1_010);
        assert_eq!(clock.now_ns(), 1_020);
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }
}
