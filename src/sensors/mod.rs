//! Sensor subsystem: reading types and the thermocouple reader.
//!
//! A [`TemperatureReading`] is produced once per control tick by either the
//! [`ThermocoupleReader`](thermocouple::ThermocoupleReader) or the thermal
//! simulator, and is never mutated afterwards.

pub mod thermocouple;

use core::fmt;

/// Fault conditions a thermocouple chip can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Open circuit: no thermocouple connected.
    Disconnected,
    ShortToGround,
    ShortToVcc,
    /// The two thermocouple leads are shorted together.
    ShortToShort,
    /// Unclassified fault, including a driver read that timed out.
    Unknown,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "thermocouple disconnected"),
            Self::ShortToGround => write!(f, "short to ground"),
            Self::ShortToVcc => write!(f, "short to VCC"),
            Self::ShortToShort => write!(f, "leads shorted together"),
            Self::Unknown => write!(f, "unknown thermocouple fault"),
        }
    }
}

/// One observation from the sensor driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawSample {
    Celsius(f32),
    Fault(FaultKind),
}

/// The reduced temperature for one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureReading {
    /// `confidence` is the fraction of the sample window that was valid.
    Value { celsius: f32, confidence: f32 },
    Fault(FaultKind),
}

impl TemperatureReading {
    /// A fully trusted value (simulator, tests).
    pub const fn exact(celsius: f32) -> Self {
        Self::Value {
            celsius,
            confidence: 1.0,
        }
    }

    /// The temperature, if this reading is not a fault.
    pub fn celsius(&self) -> Option<f32> {
        match self {
            Self::Value { celsius, .. } => Some(*celsius),
            Self::Fault(_) => None,
        }
    }

    pub fn fault(&self) -> Option<FaultKind> {
        match self {
            Self::Value { .. } => None,
            Self::Fault(kind) => Some(*kind),
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}
