//! PID controller for element duty.
//!
//! Outside the control window the controller is a plain on/off switch and
//! the integral is frozen; inside it, standard PID with the output clamped
//! to a duty fraction in [0, 1].

use log::debug;

use crate::config::{KilnConfig, PidGains};

/// Per-term breakdown of the last computation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidStats {
    pub error: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub output: f32,
    pub outside_window: bool,
}

impl PidStats {
    pub const ZERO: Self = Self {
        error: 0.0,
        p: 0.0,
        i: 0.0,
        d: 0.0,
        output: 0.0,
        outside_window: false,
    };
}

/// PID controller
pub struct PidController {
    gains: PidGains,
    window: f32,
    reset_on_entry: bool,
    integral: f32,
    prev_error: f32,
    prev_output: f32,
    outside_window: bool,
    stats: PidStats,
}

impl PidController {
    pub fn new(config: &KilnConfig) -> Self {
        Self {
            gains: config.pid,
            window: config.pid_control_window,
            reset_on_entry: config.pid_reset_on_window_entry,
            integral: 0.0,
            prev_error: 0.0,
            prev_output: 0.0,
            outside_window: false,
            stats: PidStats::ZERO,
        }
    }

    /// Compute the duty fraction for `measured` against `setpoint`.
    ///
    /// `dt` is the measured time since the previous call. A non-positive
    /// `dt` leaves all state untouched and returns the previous output.
    pub fn compute(&mut self, setpoint: f32, measured: f32, dt: f32) -> f32 {
        if dt.is_nan() || dt <= 0.0 {
            return self.prev_output;
        }
        let error = setpoint - measured;

        let output = if error.abs() > self.window {
            // On/off bypass; integral frozen.
            if !self.outside_window {
                debug!("PID: |error| {:.1} outside window, bypassing", error.abs());
            }
            self.outside_window = true;
            let out = if error > 0.0 { 1.0 } else { 0.0 };
            self.stats = PidStats {
                error,
                p: 0.0,
                i: self.gains.ki * self.integral,
                d: 0.0,
                output: out,
                outside_window: true,
            };
            out
        } else {
            if self.outside_window {
                self.outside_window = false;
                if self.reset_on_entry {
                    debug!("PID: re-entered window, integral reset");
                    self.integral = 0.0;
                    self.prev_error = error;
                }
            }

            self.integral += error * dt;
            let p = self.gains.kp * error;
            let i = self.gains.ki * self.integral;
            let d = self.gains.kd * (error - self.prev_error) / dt;
            let out = (p + i + d).clamp(0.0, 1.0);
            self.stats = PidStats {
                error,
                p,
                i,
                d,
                output: out,
                outside_window: false,
            };
            out
        };

        self.prev_error = error;
        self.prev_output = output;
        output
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_output = 0.0;
        self.outside_window = false;
        self.stats = PidStats::ZERO;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn stats(&self) -> PidStats {
        self.stats
    }
}
