//! Shared monotonic clock.
//!
//! Every log emission and every simulated-time wait is measured against a single
//! [`Clock`] captured once at simulator start. All threads in a run share the same
//! instance so that log timestamps are strictly comparable across processes.

use std::sync::Arc;
use std::time::Instant;

/// A cheaply-cloneable reference to the simulation's start-of-run instant.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Arc<Instant>,
}

impl Clock {
    /// Captures "now" as the simulation's zero point.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Arc::new(Instant::now()),
        }
    }

    /// Elapsed time since [`Clock::start`] was called, in fractional seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
