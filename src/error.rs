//! Unified error types for the kiln controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! can be carried in status snapshots and events without allocation.

use core::fmt;

use crate::app::ports::ConfigError;
use crate::fsm::{OvenRunState, Trigger};
use crate::profile::ProfileError;
use crate::sensors::FaultKind;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thermocouple reported a fault where a valid reading was required.
    Sensor(FaultKind),
    /// The heater output could not be driven.
    Actuator(ActuatorError),
    /// A safety interlock demanded a shutdown.
    Safety(ShutdownReason),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A firing profile failed validation.
    Profile(ProfileError),
    /// The requested trigger is not legal from the current run state.
    InvalidTransition { from: OvenRunState, trigger: Trigger },
    /// The command mailbox is full.
    MailboxFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Profile(e) => write!(f, "profile: {e}"),
            Self::InvalidTransition { from, trigger } => {
                write!(f, "cannot {trigger:?} while {from:?}")
            }
            Self::MailboxFull => write!(f, "command mailbox full"),
        }
    }
}

impl std::error::Error for Error {}

impl From<FaultKind> for Error {
    fn from(e: FaultKind) -> Self {
        Self::Sensor(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ProfileError> for Error {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Writing the relay pin failed.
    RelayWriteFailed,
    /// The relay worker is no longer running.
    RelayStopped,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RelayWriteFailed => write!(f, "relay write failed"),
            Self::RelayStopped => write!(f, "relay worker stopped"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Safety shutdown reasons
// ---------------------------------------------------------------------------

/// Why the emergency monitor asked for the element to be shut off.
/// Any of these aborts the run unless emergencies are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Chamber temperature reached the emergency shutoff temperature.
    OverTemperature,
    /// Too many consecutive non-disconnect thermocouple faults.
    SensorFailureStreak,
    /// Thermocouple reported disconnected for too many consecutive ticks.
    SensorDisconnected,
    /// Too large a share of each tick's sub-samples faulted, for too many
    /// consecutive ticks.
    SampleErrorRate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverTemperature => write!(f, "over temperature"),
            Self::SensorFailureStreak => write!(f, "sensor failure streak"),
            Self::SensorDisconnected => write!(f, "thermocouple disconnected"),
            Self::SampleErrorRate => write!(f, "too many sample errors"),
        }
    }
}

impl From<ShutdownReason> for Error {
    fn from(e: ShutdownReason) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
