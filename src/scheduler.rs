//! Profile scheduler: advances profile time and yields the setpoint.
//!
//! Profile time runs with the measured tick time, except while the kiln is
//! catching up: with `kiln_must_catch_up`, a reading outside the catch-up
//! window around the current target holds profile time still until the
//! kiln gets back into the band.
//!
//! ```text
//!  target ▲             ____
//!         │        ____/            profile time frozen while
//!         │   ____/  ·  ·           |reading − target| > window
//!         │  /     ·      ·
//!         │ /    ·  kiln    ·
//!         └──────────────────────▶ profile time
//! ```
//!
//! A run completes once profile time has reached the final point *and* the
//! reading is within the PID window of the final target.

use log::{debug, info};

use crate::config::KilnConfig;
use crate::profile::Profile;
use crate::sensors::TemperatureReading;

// ═══════════════════════════════════════════════════════════════
//  Step output
// ═══════════════════════════════════════════════════════════════

/// Result of one [`ProfileScheduler::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleStep {
    /// Setpoint for this tick (°C).
    pub target: f32,
    /// Profile time after this tick (seconds).
    pub profile_time: f32,
    /// Profile time was held this tick.
    pub catching_up: bool,
    pub complete: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct ProfileScheduler {
    profile: Profile,
    profile_time: f32,
    catch_up_secs: f32,
    must_catch_up: bool,
    catch_up_window: f32,
    completion_window: f32,
    catching_up: bool,
}

impl ProfileScheduler {
    /// Begin a run `start_at_secs` into `profile` (clamped to its span).
    pub fn new(profile: Profile, config: &KilnConfig, start_at_secs: f32) -> Self {
        let start = if start_at_secs.is_finite() {
            start_at_secs.clamp(0.0, profile.duration_secs())
        } else {
            0.0
        };
        if start > 0.0 {
            info!("Profile '{}' starting at {:.0}s", profile.name(), start);
        }
        Self {
            profile,
            profile_time: start,
            catch_up_secs: 0.0,
            must_catch_up: config.kiln_must_catch_up,
            catch_up_window: config.effective_catch_up_window(),
            completion_window: config.pid_control_window,
            catching_up: false,
        }
    }

    /// Advance by `dt` seconds of measured tick time.
    pub fn advance(&mut self, reading: &TemperatureReading, dt: f32) -> ScheduleStep {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let target = self.profile.target_at(self.profile_time);

        let hold = self.must_catch_up
            && match reading.celsius() {
                Some(t) => (t - target).abs() > self.catch_up_window,
                None => true,
            };

        if hold {
            if !self.catching_up {
                debug!(
                    "Catch-up: holding profile at {:.0}s (target {:.1})",
                    self.profile_time, target
                );
            }
            self.catch_up_secs += dt;
        } else {
            if self.catching_up {
                debug!(
                    "Catch-up: resumed after {:.0}s total held",
                    self.catch_up_secs
                );
            }
            self.profile_time = (self.profile_time + dt).min(self.profile.duration_secs());
        }
        self.catching_up = hold;

        let complete = self.profile_time >= self.profile.duration_secs()
            && reading
                .celsius()
                .is_some_and(|t| (t - self.profile.final_target()).abs() <= self.completion_window);

        ScheduleStep {
            target: self.profile.target_at(self.profile_time),
            profile_time: self.profile_time,
            catching_up: hold,
            complete,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn profile_time(&self) -> f32 {
        self.profile_time
    }

    /// Total seconds profile time has been held.
    pub fn catch_up_secs(&self) -> f32 {
        self.catch_up_secs
    }

    pub fn remaining_secs(&self) -> f32 {
        self.profile.duration_secs() - self.profile_time
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
