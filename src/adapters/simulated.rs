//! Simulated kiln: the thermal model behind the hardware ports.
//!
//! Stands in for both the thermocouple and the relay: the duty set on the
//! output drives the model, and each sample integrates the model over the
//! real time elapsed since the previous sample.

use core::time::Duration;

use log::info;

use crate::app::ports::{ClockPort, HeaterOutput, TemperatureSource};
use crate::config::SimulateConfig;
use crate::error::ActuatorError;
use crate::sensors::TemperatureReading;
use crate::simulator::ThermalSimulator;

pub struct SimulatedKiln<C> {
    sim: ThermalSimulator,
    clock: C,
    last_us: Option<u64>,
    duty: f32,
}

impl<C: ClockPort> SimulatedKiln<C> {
    /// `clock` must run in real time; the simulator applies its own speed.
    pub fn new(params: SimulateConfig, clock: C) -> Self {
        info!(
            "Simulated kiln: ambient {:.1}\u{00b0}C, element {:.0} W, speed x{:.1}",
            params.t_env, params.p_heat, params.speed
        );
        Self {
            sim: ThermalSimulator::new(params),
            clock,
            last_us: None,
            duty: 0.0,
        }
    }

    pub fn simulator(&self) -> &ThermalSimulator {
        &self.sim
    }

    /// Duty most recently applied to the model.
    pub fn duty(&self) -> f32 {
        self.duty
    }
}

impl<C: ClockPort> TemperatureSource for SimulatedKiln<C> {
    fn sample(&mut self) -> TemperatureReading {
        let now = self.clock.uptime_us();
        let elapsed = match self.last_us {
            Some(prev) => now.saturating_sub(prev) as f32 / 1_000_000.0,
            None => 0.0,
        };
        self.last_us = Some(now);
        self.sim.advance(self.duty, elapsed)
    }
}

impl<C: ClockPort> HeaterOutput for SimulatedKiln<C> {
    fn set_duty(&mut self, duty: f32, _cycle: Duration) -> Result<(), ActuatorError> {
        self.duty = duty.clamp(0.0, 1.0);
        Ok(())
    }
}
