//! Mock hardware for integration tests.
//!
//! Records every duty command so tests can assert on the full output
//! history without a relay, and plays back a scripted list of readings.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use kilnctl::app::events::KilnEvent;
use kilnctl::app::ports::{ClockPort, EventSink, HeaterOutput, TemperatureSource, ThermocoupleDriver};
use kilnctl::error::ActuatorError;
use kilnctl::sensors::{RawSample, TemperatureReading};

// ── MockKiln ──────────────────────────────────────────────────

/// Scripted temperature source + recording heater output.
///
/// Readings are consumed front to back; the last one repeats forever.
pub struct MockKiln {
    script: VecDeque<TemperatureReading>,
    last: TemperatureReading,
    pub duties: Vec<f32>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockKiln {
    pub fn steady(celsius: f32) -> Self {
        Self::scripted([TemperatureReading::exact(celsius)])
    }

    pub fn scripted(readings: impl IntoIterator<Item = TemperatureReading>) -> Self {
        let script: VecDeque<_> = readings.into_iter().collect();
        let last = script
            .back()
            .copied()
            .unwrap_or(TemperatureReading::exact(20.0));
        Self {
            script,
            last,
            duties: Vec::new(),
            fail_writes: false,
        }
    }

    /// Replace whatever is left of the script with a single repeating reading.
    pub fn hold(&mut self, reading: TemperatureReading) {
        self.script.clear();
        self.last = reading;
    }

    pub fn last_duty(&self) -> Option<f32> {
        self.duties.last().copied()
    }
}

impl TemperatureSource for MockKiln {
    fn sample(&mut self) -> TemperatureReading {
        if let Some(r) = self.script.pop_front() {
            self.last = r;
        }
        self.last
    }
}

impl HeaterOutput for MockKiln {
    fn set_duty(&mut self, duty: f32, _cycle: Duration) -> Result<(), ActuatorError> {
        if self.fail_writes && duty > 0.0 {
            return Err(ActuatorError::RelayWriteFailed);
        }
        self.duties.push(duty);
        Ok(())
    }
}

// ── ScriptedDriver ────────────────────────────────────────────

/// Thermocouple chip that replays raw samples in order.
pub struct ScriptedDriver {
    pub samples: Vec<RawSample>,
    pub reads: usize,
}

impl ScriptedDriver {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self { samples, reads: 0 }
    }
}

impl ThermocoupleDriver for ScriptedDriver {
    fn read_raw(&mut self, _timeout: Duration) -> Option<RawSample> {
        let s = self.samples.get(self.reads).copied();
        self.reads += 1;
        s
    }
}

/// Delay that returns immediately.
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── ManualClock ───────────────────────────────────────────────

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn advance_secs(&self, secs: f32) {
        self.0.set(self.0.get() + (secs * 1_000_000.0) as u64);
    }
}

impl ClockPort for ManualClock {
    fn uptime_us(&self) -> u64 {
        self.0.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<KilnEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&KilnEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &KilnEvent) {
        self.events.push(event.clone());
    }
}
