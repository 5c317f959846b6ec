//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`KilnEvent`] through the
//! `log` facade. Temperatures are shown in the configured display scale.

use log::{debug, error, info, warn};

use crate::app::events::KilnEvent;
use crate::app::ports::EventSink;
use crate::config::{KilnConfig, TempScale};
use crate::sensors::TemperatureReading;

/// Adapter that logs every [`KilnEvent`].
pub struct LogEventSink {
    scale: TempScale,
    currency: String,
}

impl LogEventSink {
    pub fn new(config: &KilnConfig) -> Self {
        Self {
            scale: config.temp_scale,
            currency: config.currency_type.clone(),
        }
    }

    fn temp(&self, celsius: f32) -> String {
        format!("{:.1}{}", self.scale.in_scale(celsius), self.scale.symbol())
    }

    fn reading(&self, reading: Option<TemperatureReading>) -> String {
        match reading {
            Some(TemperatureReading::Value { celsius, .. }) => self.temp(celsius),
            Some(TemperatureReading::Fault(kind)) => format!("FAULT({kind})"),
            None => "--".into(),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &KilnEvent) {
        match event {
            KilnEvent::Status(s) => {
                let line = format!(
                    "STATUS | {:?} | T={} target={} | duty={:.0}% | t={:.0}/{:.0}s{} | {:.2}kWh {}{:.2}",
                    s.run_state,
                    self.reading(s.reading),
                    self.temp(s.target),
                    s.duty * 100.0,
                    s.profile_time,
                    s.profile_duration,
                    if s.catching_up { " (catching up)" } else { "" },
                    s.energy_kwh,
                    self.currency,
                    s.cost,
                );
                if s.run_state.is_active() {
                    info!("{line}");
                } else {
                    debug!("{line}");
                }
            }
            KilnEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            KilnEvent::ProfileStarted {
                name,
                duration_secs,
                start_at_secs,
            } => {
                info!(
                    "START | profile '{}' ({:.0} min) from minute {:.1}",
                    name,
                    duration_secs / 60.0,
                    start_at_secs / 60.0
                );
            }
            KilnEvent::ProfileCompleted {
                name,
                catch_up_secs,
                energy_kwh,
            } => {
                info!(
                    "DONE | profile '{}' complete, {:.0}s spent catching up, {:.2}kWh",
                    name, catch_up_secs, energy_kwh
                );
            }
            KilnEvent::EmergencyShutdown(reason) => {
                error!("EMERGENCY | {reason}, element off");
            }
            KilnEvent::EmergencyIgnored(reason) => {
                warn!("EMERGENCY | {reason} (ignored by configuration)");
            }
            KilnEvent::SensorFault(kind) => {
                warn!("SENSOR | {kind}");
            }
            KilnEvent::CommandRejected(e) => {
                warn!("COMMAND | rejected: {e}");
            }
            KilnEvent::ActuatorFault(e) => {
                error!("ACTUATOR | {e}");
            }
        }
    }
}
