//! Outbound events and the published status snapshot.
//!
//! The [`KilnService`](super::service::KilnService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log them, keep a run history, feed a
//! UI.

use core::fmt;

use crate::control::pid::PidStats;
use crate::error::{ActuatorError, Error, ShutdownReason};
use crate::fsm::OvenRunState;
use crate::safety::EmergencyVerdict;
use crate::sensors::{FaultKind, TemperatureReading};

/// Why a run ended in `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Emergency(ShutdownReason),
    /// Abort command from the operator.
    Operator,
    Actuator(ActuatorError),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emergency(r) => write!(f, "emergency shutdown ({r})"),
            Self::Operator => write!(f, "operator abort"),
            Self::Actuator(e) => write!(f, "heater output failed ({e})"),
        }
    }
}

/// Point-in-time view of the controller, copied out to readers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub run_state: OvenRunState,
    /// `None` before the first tick.
    pub reading: Option<TemperatureReading>,
    /// Current setpoint (°C); 0 when no profile is loaded.
    pub target: f32,
    pub duty: f32,
    pub profile_time: f32,
    pub profile_duration: f32,
    pub catching_up: bool,
    pub catch_up_secs: f32,
    /// Term breakdown behind `duty`; zero outside Running.
    pub pid: PidStats,
    pub last_verdict: EmergencyVerdict,
    pub abort_reason: Option<AbortReason>,
    pub tick: u64,
    /// Energy delivered to the element this run.
    pub energy_kwh: f32,
    /// `energy_kwh × kwh_rate`.
    pub cost: f32,
}

impl StatusSnapshot {
    pub const IDLE: Self = Self {
        run_state: OvenRunState::Idle,
        reading: None,
        target: 0.0,
        duty: 0.0,
        profile_time: 0.0,
        profile_duration: 0.0,
        catching_up: false,
        catch_up_secs: 0.0,
        pid: PidStats::ZERO,
        last_verdict: EmergencyVerdict::Safe,
        abort_reason: None,
        tick: 0,
        energy_kwh: 0.0,
        cost: 0.0,
    };

    pub fn celsius(&self) -> Option<f32> {
        self.reading.and_then(|r| r.celsius())
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum KilnEvent {
    /// Published once per tick.
    Status(StatusSnapshot),

    StateChanged { from: OvenRunState, to: OvenRunState },

    ProfileStarted {
        name: String,
        duration_secs: f32,
        start_at_secs: f32,
    },

    ProfileCompleted {
        name: String,
        catch_up_secs: f32,
        energy_kwh: f32,
    },

    /// A shutdown verdict was acted on; the run is aborted.
    EmergencyShutdown(ShutdownReason),

    /// A shutdown verdict was reported but `ignore_emergencies` kept the
    /// run going.
    EmergencyIgnored(ShutdownReason),

    /// The tick's reading was a fault (transient until the streak trips).
    SensorFault(FaultKind),

    /// A command was refused; state unchanged.
    CommandRejected(Error),

    ActuatorFault(ActuatorError),
}
