//! Lumped two-mass thermal model of a kiln.
//!
//! The heating element and the chamber are each a single temperature with a
//! heat capacity, coupled to each other and to the environment through
//! thermal resistances:
//!
//! ```text
//!   p_heat·duty ──▶ [ element  c_heat ] ──R_ho──▶ [ chamber  c_oven ] ──R_o──▶ t_env
//! ```
//!
//! Integration is forward Euler, sub-stepped so that no step is longer than
//! a quarter of the fastest time constant in the current configuration.

use log::trace;

use crate::config::SimulateConfig;
use crate::sensors::TemperatureReading;

/// Largest Euler step as a fraction of the smallest time constant.
const STEP_FRACTION: f32 = 0.25;

pub struct ThermalSimulator {
    params: SimulateConfig,
    t_heat: f32,
    t_oven: f32,
    /// Simulated seconds integrated so far.
    sim_secs: f64,
}

impl ThermalSimulator {
    /// Both masses start at ambient.
    pub fn new(params: SimulateConfig) -> Self {
        let t_env = params.t_env;
        Self {
            params,
            t_heat: t_env,
            t_oven: t_env,
            sim_secs: 0.0,
        }
    }

    /// Integrate `elapsed_secs` of wall time (scaled by `speed`) with the
    /// element driven at `duty`, and report the chamber temperature.
    pub fn advance(&mut self, duty: f32, elapsed_secs: f32) -> TemperatureReading {
        let duty = if duty.is_finite() { duty.clamp(0.0, 1.0) } else { 0.0 };
        let span = elapsed_secs.max(0.0) * self.params.speed;
        if span > 0.0 {
            self.integrate(duty, span);
        }
        TemperatureReading::exact(self.t_oven)
    }

    fn integrate(&mut self, duty: f32, span: f32) {
        let p = &self.params;
        // Element fan runs while heating; the chamber vents while idle.
        let (r_ho, r_o) = if duty > 0.0 {
            (p.r_ho_air, p.r_o_nocool)
        } else {
            (p.r_ho_noair, p.r_o_cool)
        };

        let tau_heat = p.c_heat * r_ho;
        let tau_oven = p.c_oven * (r_ho * r_o) / (r_ho + r_o);
        let max_step = STEP_FRACTION * tau_heat.min(tau_oven);
        let steps = (span / max_step).ceil().max(1.0) as u32;
        let h = span / steps as f32;

        let power = p.p_heat * duty;
        for _ in 0..steps {
            let q_ho = (self.t_heat - self.t_oven) / r_ho;
            let q_env = (self.t_oven - p.t_env) / r_o;
            self.t_heat += h * (power - q_ho) / p.c_heat;
            self.t_oven += h * (q_ho - q_env) / p.c_oven;
        }
        self.sim_secs += f64::from(span);

        trace!(
            "sim: duty={:.2} span={:.2}s steps={} heat={:.1} oven={:.1}",
            duty, span, steps, self.t_heat, self.t_oven
        );
    }

    pub fn chamber_celsius(&self) -> f32 {
        self.t_oven
    }

    pub fn element_celsius(&self) -> f32 {
        self.t_heat
    }

    pub fn simulated_secs(&self) -> f64 {
        self.sim_secs
    }
}
