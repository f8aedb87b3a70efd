//! Clock collaborator.
//!
//! The engine never reads the wall clock directly. Maturity checks compare a
//! lock against whatever [`Clock::now`] reports.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Supplies the current time.
pub trait Clock {
    /// Current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep a handle after moving
/// the clock into an engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at `now`.
    #[must_use]
    pub fn at(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    /// Set the current time. Earlier values are ignored.
    pub fn set(&self, now: Timestamp) {
        self.now.fetch_max(now, Ordering::SeqCst);
    }

    /// Move time forward by `secs`.
    pub fn advance(&self, secs: u64) {
        // fetch_update only fails when the closure returns None
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(secs))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at(100);
        clock.advance(50);
        assert_eq!(clock.now(), 150);
    }

    #[test]
    fn manual_clock_is_monotonic() {
        let clock = ManualClock::at(100);
        clock.set(90);
        assert_eq!(clock.now(), 100);
        clock.set(200);
        assert_eq!(clock.now(), 200);
    }

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::at(0);
        let handle = clock.clone();
        handle.advance(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
