//! Thermocouple reader: multi-sample averaging and fault filtering.
//!
//! Each tick the reader takes `temperature_average_samples` raw samples from
//! a [`ThermocoupleDriver`], spaced evenly across the tick period, and
//! reduces the window to one [`TemperatureReading`].
//!
//! ```text
//!  t=0        t=Δ        t=2Δ              t=(N-1)Δ
//!   │ read_raw │ read_raw │ read_raw   ...    │ read_raw
//!   ▼          ▼          ▼                   ▼
//!  ┌────────────────────────────────────────────────┐
//!  │ SampleWindow (heapless, ≤ MAX_AVERAGE_SAMPLES) │──▶ reduce ──▶ reading
//!  └────────────────────────────────────────────────┘
//! ```
//!
//! With `honour_short_errors` the first fault ends the window immediately.
//! Otherwise faults are excluded and the valid samples are averaged; a
//! window with no valid sample is still a fault.

use core::time::Duration;
use std::time::Instant;

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, warn};

use super::{FaultKind, RawSample, TemperatureReading};
use crate::app::ports::{TemperatureSource, ThermocoupleDriver};
use crate::config::KilnConfig;

/// Capacity of the per-tick sample window.
pub const MAX_AVERAGE_SAMPLES: usize = 128;

/// Samples with |z| at or above this are dropped by outlier rejection.
const MAX_Z_SCORE: f32 = 2.0;

const MAINS_PERIOD_50HZ: f64 = 1.0 / 50.0;
const MAINS_PERIOD_60HZ: f64 = 1.0 / 60.0;

/// Raw samples collected within a single tick.
pub type SampleWindow = Vec<RawSample, MAX_AVERAGE_SAMPLES>;

/// Averaging, fault-classifying front end for a thermocouple driver.
pub struct ThermocoupleReader<D, W> {
    driver: D,
    delay: W,
    samples: usize,
    spacing: Duration,
    timeout: Duration,
    offset: f32,
    honour_short_errors: bool,
    reject_outliers: bool,
}

impl<D: ThermocoupleDriver, W: DelayNs> ThermocoupleReader<D, W> {
    pub fn new(driver: D, delay: W, config: &KilnConfig) -> Self {
        let tc = &config.thermocouple;
        let samples = tc.temperature_average_samples.clamp(1, MAX_AVERAGE_SAMPLES);
        let spacing = sample_spacing(config.tick_period(), samples, tc.ac_freq_50hz);
        debug!(
            "Thermocouple: {} samples/tick, spacing {:?}, offset {:+.1}",
            samples, spacing, tc.offset
        );
        Self {
            driver,
            delay,
            samples,
            spacing,
            timeout: Duration::from_millis(u64::from(tc.read_timeout_ms)),
            offset: tc.offset,
            honour_short_errors: tc.honour_short_errors,
            reject_outliers: tc.reject_outliers,
        }
    }

    /// Interval between consecutive raw samples.
    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Read one raw sample, converting a timed-out read into a fault.
    fn read_bounded(&mut self) -> RawSample {
        let started = Instant::now();
        match self.driver.read_raw(self.timeout) {
            Some(_) if started.elapsed() > self.timeout => {
                warn!("Thermocouple read exceeded {:?}", self.timeout);
                RawSample::Fault(FaultKind::Unknown)
            }
            Some(sample) => sample,
            None => RawSample::Fault(FaultKind::Unknown),
        }
    }
}

impl<D: ThermocoupleDriver, W: DelayNs> TemperatureSource for ThermocoupleReader<D, W> {
    fn sample(&mut self) -> TemperatureReading {
        let mut window = SampleWindow::new();
        let spacing_us = u32::try_from(self.spacing.as_micros()).unwrap_or(u32::MAX);

        for i in 0..self.samples {
            if i > 0 && spacing_us > 0 {
                self.delay.delay_us(spacing_us);
            }
            let raw = self.read_bounded();
            if let RawSample::Fault(kind) = raw {
                if self.honour_short_errors {
                    warn!("Thermocouple fault ({kind}) at sample {i}, failing tick");
                    return TemperatureReading::Fault(kind);
                }
            }
            // `samples` never exceeds the window capacity.
            let _ = window.push(raw);
        }

        reduce_window(&window, self.offset, self.reject_outliers)
    }
}

/// Reduce a window of raw samples to one reading.
///
/// Faults are excluded from the mean. An all-fault (or empty) window yields
/// the last observed fault. Only the first [`MAX_AVERAGE_SAMPLES`] samples
/// are considered.
pub fn reduce_window(window: &[RawSample], offset: f32, reject_outliers: bool) -> TemperatureReading {
    let window = &window[..window.len().min(MAX_AVERAGE_SAMPLES)];
    let mut valid: Vec<f32, MAX_AVERAGE_SAMPLES> = Vec::new();
    let mut last_fault = None;

    for sample in window {
        match *sample {
            RawSample::Celsius(t) if t.is_finite() => {
                // Cannot overflow: the window is capped above.
                let _ = valid.push(t);
            }
            RawSample::Celsius(_) => last_fault = Some(FaultKind::Unknown),
            RawSample::Fault(kind) => last_fault = Some(kind),
        }
    }

    if valid.is_empty() {
        return TemperatureReading::Fault(last_fault.unwrap_or(FaultKind::Unknown));
    }

    let faulted = window.len() - valid.len();
    if faulted > 0 {
        warn!(
            "Thermocouple: {}/{} samples faulted this tick (last: {})",
            faulted,
            window.len(),
            last_fault.unwrap_or(FaultKind::Unknown)
        );
    }

    let celsius = if reject_outliers {
        filtered_mean(&valid)
    } else {
        mean(&valid)
    };

    TemperatureReading::Value {
        celsius: celsius + offset,
        confidence: valid.len() as f32 / window.len() as f32,
    }
}

fn mean(samples: &[f32]) -> f32 {
    samples.iter().sum::<f32>() / samples.len() as f32
}

/// Mean after dropping samples whose z-score magnitude is ≥ 2.
fn filtered_mean(samples: &[f32]) -> f32 {
    let mu = mean(samples);
    let variance = samples.iter().map(|x| (x - mu) * (x - mu)).sum::<f32>() / samples.len() as f32;
    let sd = variance.sqrt();
    if sd == 0.0 {
        return mu;
    }

    let (sum, count) = samples
        .iter()
        .filter(|x| ((*x - mu) / sd).abs() < MAX_Z_SCORE)
        .fold((0.0f32, 0usize), |(s, n), x| (s + x, n + 1));
    if count == 0 { mu } else { sum / count as f32 }
}

/// Even spacing of `samples` reads across `period`, snapped down to whole
/// mains cycles so every sample lands at the same mains phase.
pub fn sample_spacing(period: Duration, samples: usize, ac_freq_50hz: bool) -> Duration {
    if samples <= 1 {
        return Duration::ZERO;
    }
    let even = period.as_secs_f64() / samples as f64;
    let mains = if ac_freq_50hz {
        MAINS_PERIOD_50HZ
    } else {
        MAINS_PERIOD_60HZ
    };
    let cycles = (even / mains).floor();
    if cycles < 1.0 {
        // Too short to align; keep the even spacing.
        return Duration::from_secs_f64(even);
    }
    Duration::from_secs_f64(cycles * mains)
}
