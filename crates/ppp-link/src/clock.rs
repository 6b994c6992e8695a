//! Millisecond tick source for bounded waits
//!
//! Ticks are a wrapping `u32`, so elapsed time must always be computed with
//! [`ticks_diff`] rather than plain subtraction.

use std::time::{Duration, Instant};

/// Monotonic millisecond clock with a sleep primitive
pub trait Clock {
    /// Current tick count in milliseconds; wraps at `u32::MAX`
    fn ticks_ms(&self) -> u32;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Milliseconds elapsed from `earlier` to `now`, correct across wrap-around
pub fn ticks_diff(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

/// Wall-clock implementation backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn ticks_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.origin.elapsed().as_millis() as u32
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn ticks_ms(&self) -> u32 {
        (**self).ticks_ms()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
