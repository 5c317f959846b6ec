//! Thermocouple reader against a scripted chip.

use kilnctl::app::ports::TemperatureSource;
use kilnctl::config::KilnConfig;
use kilnctl::sensors::thermocouple::ThermocoupleReader;
use kilnctl::sensors::{FaultKind, RawSample, TemperatureReading};

use crate::mock_hw::{NoDelay, ScriptedDriver};

fn forty_with_faults(faulted: &[usize]) -> Vec<RawSample> {
    (0..40)
        .map(|i| {
            if faulted.contains(&i) {
                RawSample::Fault(FaultKind::ShortToGround)
            } else {
                RawSample::Celsius(1000.0 + i as f32)
            }
        })
        .collect()
}

#[test]
fn faulted_samples_are_dropped_from_the_average() {
    let faulted = [3, 9, 17, 25, 38];
    let samples = forty_with_faults(&faulted);
    let expected: f32 = samples
        .iter()
        .filter_map(|s| match s {
            RawSample::Celsius(c) => Some(*c),
            RawSample::Fault(_) => None,
        })
        .sum::<f32>()
        / 35.0;

    let mut config = KilnConfig::default();
    config.thermocouple.honour_short_errors = false;
    let mut reader = ThermocoupleReader::new(ScriptedDriver::new(samples), NoDelay, &config);

    match reader.sample() {
        TemperatureReading::Value {
            celsius,
            confidence,
        } => {
            assert!((celsius - expected).abs() < 1e-2);
            assert!((confidence - 35.0 / 40.0).abs() < 1e-6);
        }
        r @ TemperatureReading::Fault(_) => panic!("expected a value, got {r:?}"),
    }
}

#[test]
fn honoured_short_fails_the_tick() {
    let mut config = KilnConfig::default();
    config.thermocouple.honour_short_errors = true;
    let mut reader = ThermocoupleReader::new(
        ScriptedDriver::new(forty_with_faults(&[21])),
        NoDelay,
        &config,
    );
    assert_eq!(
        reader.sample(),
        TemperatureReading::Fault(FaultKind::ShortToGround)
    );
}

#[test]
fn exhausted_driver_reads_as_fault() {
    let mut reader = ThermocoupleReader::new(
        ScriptedDriver::new(Vec::new()),
        NoDelay,
        &KilnConfig::default(),
    );
    assert_eq!(reader.sample(), TemperatureReading::Fault(FaultKind::Unknown));
}

// ── Degraded sensor behind the service ────────────────────────

mod degraded_sensor {
    use kilnctl::adapters::hardware::KilnHardware;
    use kilnctl::app::commands::OvenCommand;
    use kilnctl::app::events::{AbortReason, KilnEvent};
    use kilnctl::app::service::KilnService;
    use kilnctl::config::KilnConfig;
    use kilnctl::error::ShutdownReason;
    use kilnctl::fsm::OvenRunState;
    use kilnctl::profile::{Profile, ProfilePoint};
    use kilnctl::sensors::thermocouple::ThermocoupleReader;
    use kilnctl::sensors::{FaultKind, RawSample};

    use crate::mock_hw::{MockKiln, NoDelay, RecordingSink, ScriptedDriver};

    /// Each tick: 39 shorted sub-samples and one good one.
    fn one_good_in_forty(ticks: usize) -> Vec<RawSample> {
        let mut tick = vec![RawSample::Fault(FaultKind::ShortToGround); 39];
        tick.push(RawSample::Celsius(20.0));
        tick.repeat(ticks)
    }

    #[test]
    fn mostly_shorted_sensor_aborts_the_run() {
        let config = KilnConfig::default();
        assert!(!config.thermocouple.honour_short_errors);
        let reader = ThermocoupleReader::new(
            ScriptedDriver::new(one_good_in_forty(10)),
            NoDelay,
            &config,
        );
        let mut hw = KilnHardware::new(reader, MockKiln::steady(0.0));
        let mut svc = KilnService::new(config).unwrap();
        let mut sink = RecordingSink::new();

        let s = svc.tick(0, &mut hw, &mut sink);
        assert_eq!(s.celsius(), Some(20.0));
        svc.handle_command(
            OvenCommand::Start {
                profile: Profile::new(
                    "bisque",
                    vec![ProfilePoint::new(0.0, 600.0), ProfilePoint::new(3600.0, 600.0)],
                )
                .unwrap(),
                start_at_secs: 0.0,
            },
            &mut sink,
        )
        .unwrap();

        let s = svc.tick(2_000_000, &mut hw, &mut sink);
        assert_eq!(s.run_state, OvenRunState::Running);
        let s = svc.tick(4_000_000, &mut hw, &mut sink);
        assert_eq!(s.run_state, OvenRunState::Aborted);
        assert_eq!(
            s.abort_reason,
            Some(AbortReason::Emergency(ShutdownReason::SampleErrorRate))
        );
        assert_eq!(s.duty, 0.0);
        assert_eq!(hw.output().last_duty(), Some(0.0));
        assert_eq!(
            sink.count(|e| *e == KilnEvent::EmergencyShutdown(ShutdownReason::SampleErrorRate)),
            1
        );
    }
}

// ── Reader + relay behind the service ─────────────────────────

mod hardware_path {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use embedded_hal::digital::{ErrorType, OutputPin};
    use kilnctl::adapters::hardware::KilnHardware;
    use kilnctl::adapters::relay::RelayOutput;
    use kilnctl::app::commands::OvenCommand;
    use kilnctl::app::service::KilnService;
    use kilnctl::config::KilnConfig;
    use kilnctl::fsm::OvenRunState;
    use kilnctl::profile::{Profile, ProfilePoint};
    use kilnctl::sensors::RawSample;
    use kilnctl::sensors::thermocouple::ThermocoupleReader;

    use crate::mock_hw::{NoDelay, RecordingSink, ScriptedDriver};

    #[derive(Clone, Default)]
    struct SharedPin(Arc<Mutex<Option<bool>>>);

    impl ErrorType for SharedPin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for SharedPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            *self.0.lock().unwrap() = Some(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            *self.0.lock().unwrap() = Some(true);
            Ok(())
        }
    }

    #[test]
    fn cold_kiln_energises_relay() {
        let mut config = KilnConfig::default();
        config.thermocouple.temperature_average_samples = 4;
        let driver = ScriptedDriver::new(vec![RawSample::Celsius(20.0); 4]);
        let pin = SharedPin::default();
        let mut hw = KilnHardware::new(
            ThermocoupleReader::new(driver, NoDelay, &config),
            RelayOutput::new(pin.clone()).unwrap(),
        );
        let mut svc = KilnService::new(config).unwrap();
        let mut sink = RecordingSink::new();

        let profile = Profile::new(
            "hw",
            vec![ProfilePoint::new(0.0, 600.0), ProfilePoint::new(60.0, 600.0)],
        )
        .unwrap();
        svc.handle_command(
            OvenCommand::Start {
                profile,
                start_at_secs: 0.0,
            },
            &mut sink,
        )
        .unwrap();

        let s = svc.tick(0, &mut hw, &mut sink);
        assert_eq!(s.run_state, OvenRunState::Running);
        assert_eq!(s.duty, 1.0);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(*pin.0.lock().unwrap(), Some(true));

        let (_, relay) = hw.into_parts();
        drop(relay);
        assert_eq!(*pin.0.lock().unwrap(), Some(false));
    }
}
