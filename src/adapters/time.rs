//! Monotonic clock adapter.
//!
//! Wraps `std::time::Instant`. A speed factor greater than one makes the
//! clock run faster than wall time, which is how simulated firings are
//! compressed: the control loop sleeps `period / speed` of real time and
//! the service still sees a full period elapse.

use std::time::Instant;

use crate::app::ports::ClockPort;

pub struct SystemClock {
    start: Instant,
    speed: f64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self::scaled(1.0)
    }

    /// A clock that advances `speed` microseconds per real microsecond.
    pub fn scaled(speed: f32) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            f64::from(speed)
        } else {
            1.0
        };
        Self {
            start: Instant::now(),
            speed,
        }
    }

    /// Seconds since construction, scaled.
    pub fn uptime_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * self.speed
    }
}

impl ClockPort for SystemClock {
    fn uptime_us(&self) -> u64 {
        (self.start.elapsed().as_micros() as f64 * self.speed) as u64
    }
}
