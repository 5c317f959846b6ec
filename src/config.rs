//! Controller configuration parameters
//!
//! All tunable parameters for the kiln controller. Loaded once at startup
//! (see [`JsonConfigFile`](crate::adapters::config_file::JsonConfigFile))
//! and handed to every component by reference; nothing mutates it while a
//! control loop is alive.
//!
//! Temperatures are in °C. `temp_scale` only selects the unit used for
//! display and for profile files.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::thermocouple::MAX_AVERAGE_SAMPLES;

/// Display unit. Internal arithmetic is always Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TempScale {
    #[default]
    #[serde(rename = "c")]
    Celsius,
    #[serde(rename = "f")]
    Fahrenheit,
}

impl TempScale {
    pub fn in_scale(self, celsius: f32) -> f32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn to_celsius(self, value: f32) -> f32 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "\u{00b0}C",
            Self::Fahrenheit => "\u{00b0}F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Gains for `kp·e + ki·∫e dt + kd·de/dt`, output as a duty fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.25,
            ki: 0.000_05,
            kd: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermocoupleConfig {
    /// Raw samples averaged into one reading per tick.
    pub temperature_average_samples: usize,
    /// Fail the whole tick on the first faulted sample.
    pub honour_short_errors: bool,
    /// Added to every reading (°C).
    pub offset: f32,
    /// Mains frequency is 50 Hz (otherwise 60 Hz).
    pub ac_freq_50hz: bool,
    /// Upper bound for a single driver read.
    pub read_timeout_ms: u32,
    /// Drop samples two or more standard deviations from the mean.
    pub reject_outliers: bool,
}

impl Default for ThermocoupleConfig {
    fn default() -> Self {
        Self {
            temperature_average_samples: 40,
            honour_short_errors: false,
            offset: 0.0,
            ac_freq_50hz: false,
            read_timeout_ms: 100,
            reject_outliers: true,
        }
    }
}

/// Lumped thermal model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
    /// Ambient temperature (°C).
    pub t_env: f32,
    /// Heat capacity of the element (J/K).
    pub c_heat: f32,
    /// Heat capacity of the chamber (J/K).
    pub c_oven: f32,
    /// Element power at full duty (W).
    pub p_heat: f32,
    /// Chamber → environment resistance while heating (K/W).
    pub r_o_nocool: f32,
    /// Chamber → environment resistance while idle (K/W).
    pub r_o_cool: f32,
    /// Element → chamber resistance while idle (K/W).
    pub r_ho_noair: f32,
    /// Element → chamber resistance while heating (K/W).
    pub r_ho_air: f32,
    /// Simulated seconds per wall-clock second.
    pub speed: f32,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            t_env: 21.0,
            c_heat: 100.0,
            c_oven: 5000.0,
            p_heat: 10_000.0,
            r_o_nocool: 0.3,
            r_o_cool: 0.05,
            r_ho_noair: 0.1,
            r_ho_air: 0.05,
            speed: 1.0,
        }
    }
}

/// Core controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    // --- Timing ---
    /// Control tick period (seconds). Also the relay cycle length.
    pub sensor_time_wait: f32,

    // --- PID ---
    pub pid: PidGains,
    /// Band around the setpoint (°C) inside which PID math applies.
    pub pid_control_window: f32,
    /// Zero the integral when the error re-enters the window.
    pub pid_reset_on_window_entry: bool,

    // --- Profile ---
    /// Hold profile time while the kiln is outside the catch-up window.
    pub kiln_must_catch_up: bool,
    /// Catch-up band (°C); falls back to `pid_control_window`.
    pub catch_up_window: Option<f32>,

    // --- Safety ---
    /// Chamber temperature (°C) that forces an immediate shutdown.
    pub emergency_shutoff_temp: f32,
    /// Consecutive faulted ticks before a sensor shutdown.
    pub sensor_fault_threshold: u32,
    /// Share of faulted sub-samples a tick may carry before it counts as
    /// degraded. `sensor_fault_threshold` degraded ticks in a row shut the
    /// kiln down.
    pub max_bad_sample_fraction: f32,
    /// Report shutdown verdicts but keep running. Testing only.
    pub ignore_emergencies: bool,

    // --- Sensor / simulation ---
    pub thermocouple: ThermocoupleConfig,
    /// Run against the thermal model instead of hardware.
    pub simulated: bool,
    pub simulate: SimulateConfig,

    // --- Display / accounting ---
    pub temp_scale: TempScale,
    /// Energy price per kWh.
    pub kwh_rate: f32,
    pub currency_type: String,
    /// Element power (kW) used for energy accounting.
    pub element_power_kw: f32,
    pub log_level: LogLevel,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            // Timing
            sensor_time_wait: 2.0,

            // PID
            pid: PidGains::default(),
            pid_control_window: 10.0,
            pid_reset_on_window_entry: true,

            // Profile
            kiln_must_catch_up: true,
            catch_up_window: None,

            // Safety
            emergency_shutoff_temp: 1300.0,
            sensor_fault_threshold: 3,
            max_bad_sample_fraction: 0.30,
            ignore_emergencies: false,

            // Sensor / simulation
            thermocouple: ThermocoupleConfig::default(),
            simulated: false,
            simulate: SimulateConfig::default(),

            // Display / accounting
            temp_scale: TempScale::Celsius,
            kwh_rate: 0.30,
            currency_type: "$".into(),
            element_power_kw: 10.0,
            log_level: LogLevel::Info,
        }
    }
}

impl KilnConfig {
    /// Band used by the catch-up rule.
    pub fn effective_catch_up_window(&self) -> f32 {
        self.catch_up_window.unwrap_or(self.pid_control_window)
    }

    /// Tick period as a `Duration`. Only meaningful after [`validate`](Self::validate).
    pub fn tick_period(&self) -> core::time::Duration {
        core::time::Duration::from_secs_f32(self.sensor_time_wait)
    }

    /// Range-check every field the control loop depends on.
    ///
    /// Invalid values are rejected, never clamped: a typo must not
    /// silently disable the over-temperature shutdown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sensor_time_wait.is_finite() && self.sensor_time_wait > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "sensor_time_wait must be a positive number of seconds",
            ));
        }
        let gains = [self.pid.kp, self.pid.ki, self.pid.kd];
        if gains.iter().any(|g| !g.is_finite() || *g < 0.0) {
            return Err(ConfigError::ValidationFailed(
                "pid gains must be finite and non-negative",
            ));
        }
        if !(self.pid_control_window.is_finite() && self.pid_control_window >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "pid_control_window must be non-negative",
            ));
        }
        if let Some(w) = self.catch_up_window {
            if !(w.is_finite() && w >= 0.0) {
                return Err(ConfigError::ValidationFailed(
                    "catch_up_window must be non-negative",
                ));
            }
        }
        if !self.emergency_shutoff_temp.is_finite() {
            return Err(ConfigError::ValidationFailed(
                "emergency_shutoff_temp must be finite",
            ));
        }
        if self.sensor_fault_threshold == 0 {
            return Err(ConfigError::ValidationFailed(
                "sensor_fault_threshold must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.max_bad_sample_fraction) {
            return Err(ConfigError::ValidationFailed(
                "max_bad_sample_fraction must be between 0 and 1",
            ));
        }

        let tc = &self.thermocouple;
        if !(1..=MAX_AVERAGE_SAMPLES).contains(&tc.temperature_average_samples) {
            return Err(ConfigError::ValidationFailed(
                "temperature_average_samples must be between 1 and 128",
            ));
        }
        if !tc.offset.is_finite() {
            return Err(ConfigError::ValidationFailed("thermocouple offset must be finite"));
        }
        if tc.read_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("read_timeout_ms must be positive"));
        }

        let sim = &self.simulate;
        let positive = [
            sim.c_heat,
            sim.c_oven,
            sim.r_o_nocool,
            sim.r_o_cool,
            sim.r_ho_noair,
            sim.r_ho_air,
            sim.speed,
        ];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "simulator capacities, resistances and speed must be positive",
            ));
        }
        if !(sim.p_heat.is_finite() && sim.p_heat >= 0.0 && sim.t_env.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "simulator p_heat and t_env must be finite",
            ));
        }

        if !(self.kwh_rate.is_finite() && self.kwh_rate >= 0.0)
            || !(self.element_power_kw.is_finite() && self.element_power_kw >= 0.0)
        {
            return Err(ConfigError::ValidationFailed(
                "kwh_rate and element_power_kw must be non-negative",
            ));
        }
        Ok(())
    }
}
