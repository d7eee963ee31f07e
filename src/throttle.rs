//! Leading-edge throttling of high-frequency events.
//!
//! The first event after a quiet period is emitted immediately and opens a
//! window; anything arriving before the window has elapsed is suppressed. The
//! window is measured from the last emission, not from fixed ticks.
//!
//! There is no trailing emission. If the pointer stops moving inside a window,
//! the last suppressed position is never flushed.
//!
//! # Example
//!
//! ```rust
//! use cocursor::throttle::ThrottleScheduler;
//! use std::time::{Duration, Instant};
//!
//! let mut throttle = ThrottleScheduler::new(Duration::from_millis(30));
//! let start = Instant::now();
//!
//! assert!(throttle.try_acquire(start));
//! assert!(!throttle.try_acquire(start + Duration::from_millis(5)));
//! assert!(throttle.try_acquire(start + Duration::from_millis(35)));
//! ```

use std::time::{Duration, Instant};

use crate::types::QualityTier;

/// Rate limiter admitting at most one emission per interval.
#[derive(Debug, Clone)]
pub struct ThrottleScheduler {
    interval: Duration,
    last_emission: Option<Instant>,
}

impl ThrottleScheduler {
    /// Creates a scheduler with the given minimum spacing between emissions.
    ///
    /// A zero interval is a pass-through.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emission: None,
        }
    }

    /// Creates a scheduler for a quality tier
    pub fn for_quality(tier: QualityTier) -> Self {
        Self::new(tier.interval())
    }

    /// Decides whether an event observed at `now` may be emitted.
    ///
    /// Returns `true` and records the emission when the window since the
    /// previous emission has elapsed, `false` when the event is suppressed.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_emission {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }

        self.last_emission = Some(now);
        true
    }

    /// Changes the interval; the current window keeps its start.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Forgets the last emission so the next event passes
    pub fn reset(&mut self) {
        self.last_emission = None;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_emission(&self) -> Option<Instant> {
        self.last_emission
    }
}

impl Default for ThrottleScheduler {
    fn default() -> Self {
        Self::for_quality(QualityTier::default())
    }
}
