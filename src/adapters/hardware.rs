//! Hardware adapter: pairs a temperature source with a heater output.
//!
//! The service wants one value that is both a [`TemperatureSource`] and a
//! [`HeaterOutput`]. On real hardware those are separate devices (a
//! thermocouple reader and a relay); this adapter bundles them. The
//! simulated kiln implements both traits itself and needs no bundling.

use core::time::Duration;

use crate::app::ports::{HeaterOutput, TemperatureSource};
use crate::error::ActuatorError;
use crate::sensors::TemperatureReading;

pub struct KilnHardware<S, O> {
    source: S,
    output: O,
}

impl<S, O> KilnHardware<S, O> {
    pub fn new(source: S, output: O) -> Self {
        Self { source, output }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_parts(self) -> (S, O) {
        (self.source, self.output)
    }
}

// ── TemperatureSource ─────────────────────────────────────────

impl<S: TemperatureSource, O> TemperatureSource for KilnHardware<S, O> {
    fn sample(&mut self) -> TemperatureReading {
        self.source.sample()
    }
}

// ── HeaterOutput ──────────────────────────────────────────────

impl<S, O: HeaterOutput> HeaterOutput for KilnHardware<S, O> {
    fn set_duty(&mut self, duty: f32, cycle: Duration) -> Result<(), ActuatorError> {
        self.output.set_duty(duty, cycle)
    }
}
