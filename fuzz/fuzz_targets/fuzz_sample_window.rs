//! Fuzz target: thermocouple sample reduction
//!
//! Decodes fuzz bytes into a window of raw samples (5 bytes each: a tag
//! byte and an `f32`) and reduces it with and without outlier rejection.
//!
//! Invariants checked:
//! - No panics, including on NaN and infinite samples
//! - Confidence is always within `[0, 1]`
//! - A fault is returned only when no sample was a finite temperature
//!
//! cargo fuzz run fuzz_sample_window

#![no_main]

use kilnctl::sensors::thermocouple::{MAX_AVERAGE_SAMPLES, reduce_window};
use kilnctl::sensors::{FaultKind, RawSample, TemperatureReading};
use libfuzzer_sys::fuzz_target;

fn decode(chunk: &[u8]) -> RawSample {
    let value = f32::from_le_bytes([chunk[1], chunk[2], chunk[3], chunk[4]]);
    match chunk[0] % 6 {
        0 => RawSample::Fault(FaultKind::Disconnected),
        1 => RawSample::Fault(FaultKind::ShortToGround),
        2 => RawSample::Fault(FaultKind::ShortToVcc),
        _ => RawSample::Celsius(value),
    }
}

fuzz_target!(|data: &[u8]| {
    let window: Vec<RawSample> = data
        .chunks_exact(5)
        .take(MAX_AVERAGE_SAMPLES)
        .map(decode)
        .collect();
    if window.is_empty() {
        return;
    }
    let any_valid = window.iter().any(|s| matches!(s, RawSample::Celsius(c) if c.is_finite()));

    for reject in [false, true] {
        match reduce_window(&window, 0.0, reject) {
            TemperatureReading::Value { confidence, .. } => {
                assert!((0.0..=1.0).contains(&confidence));
            }
            TemperatureReading::Fault(_) => assert!(!any_valid),
        }
    }
});
