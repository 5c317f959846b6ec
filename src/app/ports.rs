//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ KilnService (domain)
//! ```
//!
//! Driven adapters (thermocouple, relay, clock, event sinks, files)
//! implement these traits. The [`KilnService`](super::service::KilnService)
//! consumes them via generics, so the control core never touches hardware
//! directly.

use core::time::Duration;

use crate::config::KilnConfig;
use crate::error::ActuatorError;
use crate::profile::{Profile, ProfileError};
use crate::sensors::{RawSample, TemperatureReading};

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw thermocouple chip access, called many times per tick.
pub trait ThermocoupleDriver {
    /// One conversion. `None` means the read did not finish within
    /// `timeout`.
    fn read_raw(&mut self, timeout: Duration) -> Option<RawSample>;
}

/// One reduced reading per control tick.
pub trait TemperatureSource {
    fn sample(&mut self) -> TemperatureReading;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Heating element output.
pub trait HeaterOutput {
    /// Energise the element for `duty × cycle` of the next `cycle`.
    /// Each call supersedes the previous one.
    fn set_duty(&mut self, duty: f32, cycle: Duration) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source for measuring tick length.
pub trait ClockPort {
    fn uptime_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`KilnEvent`](super::events::KilnEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::KilnEvent);
}

/// Fan an event out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::KilnEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &super::events::KilnEvent) {
        (**self).emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration / profile ports (driven adapter: files)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<KilnConfig, ConfigError>;
    fn save(&self, config: &KilnConfig) -> Result<(), ConfigError>;
}

/// Supplies firing profiles by name.
pub trait ProfileSource {
    fn load_profile(&self, name: &str) -> Result<Profile, ProfileError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file.
    NotFound,
    /// The file exists but does not parse.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
