/// Smoothed render cycle timer

use std::time::{Duration, Instant};

/// Weight kept from the previous estimate at every stop
const OLD_FRACTION: f64 = 0.9;

/// Initial guess of the cycle time, in seconds
pub const INITIAL_CYCLE_TIME: f64 = 3e-3;

#[derive(Debug, Clone)]
pub struct FrameTimer {
    cumulative: f64,
    last_start: Option<Instant>,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(INITIAL_CYCLE_TIME)
    }
}

impl FrameTimer {
    pub fn new(initial: f64) -> Self {
        Self { cumulative: initial, last_start: None }
    }

    pub fn start(&mut self) {
        self.last_start = Some(Instant::now());
    }

    /// Fold the time since `start` into the estimate; ignored without a start
    pub fn stop(&mut self) {
        if let Some(start) = self.last_start.take() {
            self.record(start.elapsed());
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.cumulative = self.cumulative * OLD_FRACTION + elapsed.as_secs_f64() * (1.0 - OLD_FRACTION);
    }

    /// Smoothed cycle time in seconds
    pub fn read(&self) -> f64 {
        self.cumulative
    }
}
