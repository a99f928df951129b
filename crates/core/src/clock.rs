//! Injectable time source
//!
//! Modification stamps and the edit-coalescing deadline both read a [`Clock`]
//! so that timing behaviour can be driven deterministically from tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic timestamp in milliseconds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Milliseconds since the clock's epoch
    pub fn millis(&self) -> u64 {
        self.0
    }

    /// Timestamp `ms` milliseconds after this one
    pub fn plus_millis(&self, ms: u64) -> Self {
        Timestamp(self.0.saturating_add(ms))
    }
}

/// Source of monotonic time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock measured from the moment it was created
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.epoch.elapsed().as_millis() as u64)
    }
}

/// Manually advanced clock
///
/// Clones share the same counter, so a test can keep one handle while the
/// editor owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at the given time
    pub fn starting_at(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        assert_eq!(clock.now(), Timestamp(0));
        handle.advance(250);
        assert_eq!(clock.now(), Timestamp(250));
        handle.set(1000);
        assert_eq!(clock.now().millis(), 1000);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_timestamp_plus_millis() {
        assert_eq!(Timestamp(100).plus_millis(400), Timestamp(500));
        assert_eq!(Timestamp(u64::MAX).plus_millis(1), Timestamp(u64::MAX));
    }
}
