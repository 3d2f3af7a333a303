use std::time::Instant;

/// Clock used to timestamp a matched response. The host experiment runner
/// injects its own so that response times line up with its stimulus
/// timestamps; `MonotonicClock` is the standalone default.
pub trait Clock {
    /// Current time in milliseconds on a monotonic scale.
    fn now_ms(&self) -> f64;
}

/// Milliseconds elapsed since the clock was created.
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}
