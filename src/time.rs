//! Time expressions and the current-time source

use std::sync::atomic::Ordering;

use atomic_float::AtomicF64;
use serde::{Deserialize, Serialize};

/// Source of "now" in seconds on the parameter's timeline
pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Clock advanced by hand; share it through an `Arc`.
#[derive(Debug)]
pub struct ManualClock {
    seconds: AtomicF64,
}

impl ManualClock {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds: AtomicF64::new(seconds),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.store(seconds, Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: f64) {
        self.seconds.fetch_add(seconds, Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.seconds.load(Ordering::Relaxed)
    }
}

/// Symbolic point in time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Time {
    /// The clock's current time
    #[default]
    Now,
    /// Absolute seconds
    At(f64),
    /// Seconds relative to now
    FromNow(f64),
}

impl Time {
    #[must_use]
    pub fn to_seconds(&self, clock: &dyn Clock) -> f64 {
        match *self {
            Time::Now => clock.now(),
            Time::At(seconds) => seconds,
            Time::FromNow(offset) => clock.now() + offset,
        }
    }
}

impl From<f64> for Time {
    fn from(seconds: f64) -> Self {
        Time::At(seconds)
    }
}
