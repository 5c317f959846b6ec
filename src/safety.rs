//! Emergency monitor.
//!
//! Runs **every tick before the control math**, whatever the run state,
//! and turns the latest reading into an [`EmergencyVerdict`]. Rules are
//! evaluated in order and the first match wins:
//!
//! 1. Valid reading at or above `emergency_shutoff_temp` → `OverTemperature`.
//! 2. `Disconnected` fault → disconnect streak +1; at `sensor_fault_threshold`
//!    consecutive ticks → `SensorDisconnected`.
//! 3. Any other fault → generic streak +1; same threshold → `SensorFailureStreak`.
//! 4. Valid reading with more than `max_bad_sample_fraction` of its
//!    sub-samples faulted → degraded streak +1; same threshold →
//!    `SampleErrorRate`. Faulted ticks count towards this streak too.
//! 5. Otherwise → all streaks cleared, `Safe`.
//!
//! A shutdown verdict is logged when it first appears, not on every tick
//! it persists. The monitor only reports. Whether a verdict aborts the run
//! (and whether `ignore_emergencies` suppresses that) is the
//! orchestrator's decision.

use core::fmt;

use log::{error, info, warn};

use crate::config::KilnConfig;
use crate::error::ShutdownReason;
use crate::fsm::OvenRunState;
use crate::sensors::{FaultKind, TemperatureReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyVerdict {
    Safe,
    ShutdownRequested(ShutdownReason),
}

impl EmergencyVerdict {
    pub fn is_shutdown(self) -> bool {
        matches!(self, Self::ShutdownRequested(_))
    }
}

/// Emergency monitor.
pub struct EmergencyMonitor {
    shutoff_c: f32,
    threshold: u32,
    max_bad_fraction: f32,
    /// Consecutive `Disconnected` ticks.
    disconnect_streak: u32,
    /// Consecutive ticks with any other fault.
    fault_streak: u32,
    /// Consecutive ticks above the bad-sample fraction, faults included.
    degraded_streak: u32,
    last: EmergencyVerdict,
}

impl EmergencyMonitor {
    pub fn new(config: &KilnConfig) -> Self {
        Self {
            shutoff_c: config.emergency_shutoff_temp,
            threshold: config.sensor_fault_threshold.max(1),
            max_bad_fraction: config.max_bad_sample_fraction,
            disconnect_streak: 0,
            fault_streak: 0,
            degraded_streak: 0,
            last: EmergencyVerdict::Safe,
        }
    }

    /// Evaluate one reading.
    pub fn check(&mut self, reading: &TemperatureReading, state: OvenRunState) -> EmergencyVerdict {
        let verdict = match *reading {
            TemperatureReading::Value { celsius, .. } if celsius >= self.shutoff_c => self.trip(
                ShutdownReason::OverTemperature,
                state,
                format_args!("{:.1}\u{00b0}C >= shutoff {:.1}\u{00b0}C", celsius, self.shutoff_c),
            ),
            TemperatureReading::Fault(FaultKind::Disconnected) => {
                self.disconnect_streak = self.disconnect_streak.saturating_add(1);
                self.degraded_streak = self.degraded_streak.saturating_add(1);
                self.streak_verdict(
                    self.disconnect_streak,
                    FaultKind::Disconnected,
                    ShutdownReason::SensorDisconnected,
                    state,
                )
            }
            TemperatureReading::Fault(kind) => {
                self.fault_streak = self.fault_streak.saturating_add(1);
                self.degraded_streak = self.degraded_streak.saturating_add(1);
                self.streak_verdict(
                    self.fault_streak,
                    kind,
                    ShutdownReason::SensorFailureStreak,
                    state,
                )
            }
            TemperatureReading::Value { confidence, .. } => {
                if self.disconnect_streak > 0 || self.fault_streak > 0 {
                    info!(
                        "Thermocouple recovered after {} fault tick(s)",
                        self.disconnect_streak.max(self.fault_streak)
                    );
                }
                self.disconnect_streak = 0;
                self.fault_streak = 0;
                self.sample_rate_verdict(1.0 - confidence, state)
            }
        };

        if self.last.is_shutdown() && !verdict.is_shutdown() {
            info!("Emergency condition cleared");
        }
        self.last = verdict;
        verdict
    }

    pub fn disconnect_streak(&self) -> u32 {
        self.disconnect_streak
    }

    pub fn fault_streak(&self) -> u32 {
        self.fault_streak
    }

    pub fn degraded_streak(&self) -> u32 {
        self.degraded_streak
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Shutdown verdict for `reason`, logged only when it is new.
    fn trip(
        &self,
        reason: ShutdownReason,
        state: OvenRunState,
        detail: fmt::Arguments<'_>,
    ) -> EmergencyVerdict {
        let verdict = EmergencyVerdict::ShutdownRequested(reason);
        if self.last != verdict {
            error!("EMERGENCY: {reason}: {detail} while {:?}", state);
        }
        verdict
    }

    fn streak_verdict(
        &self,
        streak: u32,
        kind: FaultKind,
        reason: ShutdownReason,
        state: OvenRunState,
    ) -> EmergencyVerdict {
        if streak >= self.threshold {
            self.trip(
                reason,
                state,
                format_args!("{kind} for {streak} consecutive tick(s)"),
            )
        } else {
            warn!("Thermocouple fault: {kind} ({streak}/{})", self.threshold);
            EmergencyVerdict::Safe
        }
    }

    fn sample_rate_verdict(&mut self, bad_fraction: f32, state: OvenRunState) -> EmergencyVerdict {
        if bad_fraction <= self.max_bad_fraction {
            self.degraded_streak = 0;
            return EmergencyVerdict::Safe;
        }
        self.degraded_streak = self.degraded_streak.saturating_add(1);
        let streak = self.degraded_streak;
        if streak >= self.threshold {
            self.trip(
                ShutdownReason::SampleErrorRate,
                state,
                format_args!(
                    "{:.0}% of samples faulted, {streak} tick(s) running",
                    bad_fraction * 100.0
                ),
            )
        } else {
            warn!(
                "Thermocouple: {:.0}% of samples faulted ({streak}/{})",
                bad_fraction * 100.0,
                self.threshold
            );
            EmergencyVerdict::Safe
        }
    }
}
