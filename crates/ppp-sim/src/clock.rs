//! Deterministic clock for timeout tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ppp_link::Clock;

/// Clock whose ticks only move on `advance` or `sleep`
///
/// Sleeping advances the tick count by the requested duration instead of
/// blocking, so a 4 second bounded wait runs instantly. Clones share the same
/// tick counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU32>,
    sleeps: Arc<AtomicU32>,
}

impl ManualClock {
    /// Start at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at an arbitrary tick, e.g. just below the wrap point
    pub fn starting_at(ticks: u32) -> Self {
        let clock = Self::default();
        clock.ticks.store(ticks, Ordering::SeqCst);
        clock
    }

    /// Move time forward by `ms`, wrapping at `u32::MAX`
    pub fn advance(&self, ms: u32) {
        // fetch_add wraps on overflow
        self.ticks.fetch_add(ms, Ordering::SeqCst);
    }

    /// Number of times `sleep` was called
    pub fn sleep_count(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn ticks_ms(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(duration.as_millis().min(u32::MAX as u128) as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppp_link::ticks_diff;

    #[test]
    fn test_sleep_advances_without_blocking() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_millis(4000));
        assert_eq!(clock.ticks_ms(), 4000);
        assert_eq!(clock.sleep_count(), 1);
    }

    #[test]
    fn test_wraps() {
        let clock = ManualClock::starting_at(u32::MAX - 5);
        let t0 = clock.ticks_ms();
        clock.advance(10);
        assert_eq!(clock.ticks_ms(), 4);
        assert_eq!(ticks_diff(clock.ticks_ms(), t0), 10);
    }

    #[test]
    fn test_clones_share_ticks() {
        let clock = ManualClock::new();
        let other = clock.clone();
        other.advance(7);
        assert_eq!(clock.ticks_ms(), 7);
    }
}
