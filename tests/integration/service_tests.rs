//! KilnService driven end to end through its ports: commands in, readings
//! in, duty and events out.

use kilnctl::app::commands::OvenCommand;
use kilnctl::app::events::{AbortReason, KilnEvent, StatusSnapshot};
use kilnctl::app::ports::ClockPort;
use kilnctl::app::service::KilnService;
use kilnctl::config::KilnConfig;
use kilnctl::error::{Error, ShutdownReason};
use kilnctl::fsm::{OvenRunState, Trigger};
use kilnctl::profile::{Profile, ProfilePoint};
use kilnctl::safety::EmergencyVerdict;
use kilnctl::sensors::{FaultKind, TemperatureReading};

use crate::mock_hw::{ManualClock, MockKiln, RecordingSink};

struct Rig {
    svc: KilnService,
    kiln: MockKiln,
    clock: ManualClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: KilnConfig, kiln: MockKiln) -> Self {
        Self {
            svc: KilnService::new(config).unwrap(),
            kiln,
            clock: ManualClock::default(),
            sink: RecordingSink::new(),
        }
    }

    fn start(&mut self, profile: Profile) {
        self.svc
            .handle_command(
                OvenCommand::Start {
                    profile,
                    start_at_secs: 0.0,
                },
                &mut self.sink,
            )
            .unwrap();
    }

    fn tick(&mut self) -> StatusSnapshot {
        let now = self.clock.uptime_us();
        let s = self.svc.tick(now, &mut self.kiln, &mut self.sink);
        self.clock.advance_secs(self.svc.config().sensor_time_wait);
        s
    }
}

fn flat(target: f32, secs: f32) -> Profile {
    Profile::new(
        "flat",
        vec![ProfilePoint::new(0.0, target), ProfilePoint::new(secs, target)],
    )
    .unwrap()
}

// ── Scenario A: over-temperature aborts the run ───────────────

#[test]
fn over_temperature_aborts_running_kiln() {
    let mut config = KilnConfig::default();
    config.emergency_shutoff_temp = 2264.0;
    let mut rig = Rig::new(config, MockKiln::steady(1000.0));
    rig.start(flat(1000.0, 3600.0));
    assert_eq!(rig.tick().run_state, OvenRunState::Running);

    rig.kiln.hold(TemperatureReading::exact(2300.0));
    let s = rig.tick();
    assert_eq!(
        s.last_verdict,
        EmergencyVerdict::ShutdownRequested(ShutdownReason::OverTemperature)
    );
    assert_eq!(s.run_state, OvenRunState::Aborted);
    assert_eq!(
        s.abort_reason,
        Some(AbortReason::Emergency(ShutdownReason::OverTemperature))
    );
    assert_eq!(rig.kiln.last_duty(), Some(0.0));
    assert_eq!(
        rig.sink
            .count(|e| *e == KilnEvent::EmergencyShutdown(ShutdownReason::OverTemperature)),
        1
    );

    // Stays off while aborted, even though the kiln is still hot.
    rig.tick();
    assert_eq!(rig.svc.state(), OvenRunState::Aborted);
    assert_eq!(rig.kiln.last_duty(), Some(0.0));
}

#[test]
fn over_temperature_while_idle_changes_nothing() {
    let mut config = KilnConfig::default();
    config.emergency_shutoff_temp = 500.0;
    let mut rig = Rig::new(config, MockKiln::steady(600.0));
    let s = rig.tick();
    assert_eq!(s.run_state, OvenRunState::Idle);
    assert!(s.last_verdict.is_shutdown());
    assert_eq!(
        rig.sink.count(|e| matches!(e, KilnEvent::EmergencyShutdown(_))),
        0
    );
}

// ── Scenario D: catch-up freezes profile time ─────────────────

#[test]
fn profile_time_freezes_while_kiln_lags() {
    let mut config = KilnConfig::default();
    config.pid_control_window = 10.0;
    let profile = Profile::new(
        "ramp",
        vec![ProfilePoint::new(0.0, 0.0), ProfilePoint::new(3600.0, 100.0)],
    )
    .unwrap();
    let mut rig = Rig::new(config, MockKiln::steady(5.0));
    rig.start(profile);

    let mut last = StatusSnapshot::IDLE;
    for _ in 0..600 {
        last = rig.tick();
    }
    // 20 minutes of wall time, profile stuck where target left 5±10.
    assert!(last.catching_up);
    assert!(
        (540.0..=542.0).contains(&last.profile_time),
        "profile time {}",
        last.profile_time
    );
    assert!(last.catch_up_secs > 600.0);
    assert_eq!(last.run_state, OvenRunState::Running);

    // Kiln catches up: time moves again.
    rig.kiln.hold(TemperatureReading::exact(15.0));
    let s = rig.tick();
    assert!(!s.catching_up);
    assert!(s.profile_time > last.profile_time);
}

#[test]
fn without_catch_up_time_always_advances() {
    let mut config = KilnConfig::default();
    config.kiln_must_catch_up = false;
    let mut rig = Rig::new(config, MockKiln::steady(5.0));
    rig.start(flat(500.0, 3600.0));
    let mut s = StatusSnapshot::IDLE;
    for _ in 0..10 {
        s = rig.tick();
    }
    assert!((s.profile_time - 20.0).abs() < 1e-3);
    assert!(!s.catching_up);
}

// ── Scenario E: ignore_emergencies keeps the run going ────────

#[test]
fn ignored_emergency_keeps_heating() {
    let mut config = KilnConfig::default();
    config.emergency_shutoff_temp = 1000.0;
    config.ignore_emergencies = true;
    let mut rig = Rig::new(config, MockKiln::steady(1100.0));
    rig.start(flat(1200.0, 3600.0));

    let s = rig.tick();
    assert_eq!(s.run_state, OvenRunState::Running);
    assert_eq!(
        s.last_verdict,
        EmergencyVerdict::ShutdownRequested(ShutdownReason::OverTemperature)
    );
    // 100 °C below target is outside the PID window: full power.
    assert_eq!(s.duty, 1.0);
    assert_eq!(rig.kiln.last_duty(), Some(1.0));
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, KilnEvent::EmergencyIgnored(ShutdownReason::OverTemperature))),
        1
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, KilnEvent::EmergencyShutdown(_))),
        0
    );
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn transient_fault_turns_element_off_for_one_tick() {
    let mut rig = Rig::new(
        KilnConfig::default(),
        MockKiln::scripted([
            TemperatureReading::exact(20.0),
            TemperatureReading::Fault(FaultKind::ShortToGround),
            TemperatureReading::exact(20.0),
        ]),
    );
    rig.start(flat(500.0, 3600.0));
    assert_eq!(rig.tick().duty, 1.0);
    let s = rig.tick();
    assert_eq!(s.duty, 0.0);
    assert_eq!(s.run_state, OvenRunState::Running);
    assert_eq!(rig.tick().duty, 1.0);
    assert_eq!(
        rig.sink
            .count(|e| *e == KilnEvent::SensorFault(FaultKind::ShortToGround)),
        1
    );
}

#[test]
fn fault_streak_aborts_on_threshold() {
    let mut config = KilnConfig::default();
    config.sensor_fault_threshold = 3;
    let mut rig = Rig::new(config, MockKiln::steady(20.0));
    rig.start(flat(500.0, 3600.0));
    rig.tick();

    rig.kiln.hold(TemperatureReading::Fault(FaultKind::Disconnected));
    assert_eq!(rig.tick().run_state, OvenRunState::Running);
    assert_eq!(rig.tick().run_state, OvenRunState::Running);
    let s = rig.tick();
    assert_eq!(s.run_state, OvenRunState::Aborted);
    assert_eq!(
        s.abort_reason,
        Some(AbortReason::Emergency(ShutdownReason::SensorDisconnected))
    );
}

#[test]
fn start_refused_while_sensor_faulted() {
    let mut rig = Rig::new(
        KilnConfig::default(),
        MockKiln::steady(20.0),
    );
    rig.kiln.hold(TemperatureReading::Fault(FaultKind::ShortToVcc));
    rig.tick();
    let err = rig
        .svc
        .handle_command(
            OvenCommand::Start {
                profile: flat(500.0, 60.0),
                start_at_secs: 0.0,
            },
            &mut rig.sink,
        )
        .unwrap_err();
    assert_eq!(err, Error::Sensor(FaultKind::ShortToVcc));
    assert_eq!(rig.svc.state(), OvenRunState::Idle);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, KilnEvent::CommandRejected(Error::Sensor(_)))),
        1
    );
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn run_completes_and_resets() {
    let profile = Profile::new(
        "short",
        vec![ProfilePoint::new(0.0, 25.0), ProfilePoint::new(10.0, 30.0)],
    )
    .unwrap();
    let mut rig = Rig::new(KilnConfig::default(), MockKiln::steady(30.0));
    rig.start(profile);

    let mut s = StatusSnapshot::IDLE;
    for _ in 0..10 {
        s = rig.tick();
        if s.run_state == OvenRunState::Complete {
            break;
        }
    }
    assert_eq!(s.run_state, OvenRunState::Complete);
    assert_eq!(s.duty, 0.0);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, KilnEvent::ProfileCompleted { name, .. } if name == "short")),
        1
    );

    rig.svc
        .handle_command(OvenCommand::Reset, &mut rig.sink)
        .unwrap();
    assert_eq!(rig.svc.state(), OvenRunState::Idle);
    assert!(rig.svc.profile().is_none());
}

#[test]
fn completion_waits_for_final_temperature() {
    let mut config = KilnConfig::default();
    config.kiln_must_catch_up = false;
    let profile = Profile::new(
        "cool",
        vec![ProfilePoint::new(0.0, 100.0), ProfilePoint::new(4.0, 100.0)],
    )
    .unwrap();
    let mut rig = Rig::new(config, MockKiln::steady(50.0));
    rig.start(profile);
    for _ in 0..5 {
        rig.tick();
    }
    assert_eq!(rig.svc.state(), OvenRunState::Running);
    rig.kiln.hold(TemperatureReading::exact(95.0));
    assert_eq!(rig.tick().run_state, OvenRunState::Complete);
}

#[test]
fn pause_holds_profile_and_element() {
    let mut rig = Rig::new(KilnConfig::default(), MockKiln::steady(20.0));
    rig.start(flat(20.0, 3600.0));
    rig.tick();
    let before = rig.tick().profile_time;

    rig.svc
        .handle_command(OvenCommand::Pause, &mut rig.sink)
        .unwrap();
    for _ in 0..5 {
        let s = rig.tick();
        assert_eq!(s.run_state, OvenRunState::Paused);
        assert_eq!(s.duty, 0.0);
        assert_eq!(s.profile_time, before);
    }

    rig.svc
        .handle_command(OvenCommand::Resume, &mut rig.sink)
        .unwrap();
    assert!(rig.tick().profile_time > before);
}

#[test]
fn operator_abort_and_invalid_commands() {
    let mut rig = Rig::new(KilnConfig::default(), MockKiln::steady(20.0));

    // Nothing to pause or reset while idle.
    assert_eq!(
        rig.svc.handle_command(OvenCommand::Pause, &mut rig.sink),
        Err(Error::InvalidTransition {
            from: OvenRunState::Idle,
            trigger: Trigger::Pause
        })
    );
    // Abort while idle is a no-op, not an error.
    assert!(rig.svc.handle_command(OvenCommand::Abort, &mut rig.sink).is_ok());

    rig.start(flat(500.0, 3600.0));
    rig.tick();
    rig.svc
        .handle_command(OvenCommand::Abort, &mut rig.sink)
        .unwrap();
    let s = rig.tick();
    assert_eq!(s.run_state, OvenRunState::Aborted);
    assert_eq!(s.abort_reason, Some(AbortReason::Operator));
    assert_eq!(rig.kiln.last_duty(), Some(0.0));

    // A second start needs a reset first.
    let again = rig.svc.handle_command(
        OvenCommand::Start {
            profile: flat(500.0, 60.0),
            start_at_secs: 0.0,
        },
        &mut rig.sink,
    );
    assert!(matches!(again, Err(Error::InvalidTransition { .. })));
}

#[test]
fn output_failure_aborts_run() {
    let mut kiln = MockKiln::steady(20.0);
    kiln.fail_writes = true;
    let mut rig = Rig::new(KilnConfig::default(), kiln);
    rig.start(flat(500.0, 3600.0));
    let s = rig.tick();
    assert_eq!(s.run_state, OvenRunState::Aborted);
    assert!(matches!(s.abort_reason, Some(AbortReason::Actuator(_))));
    assert_eq!(rig.kiln.last_duty(), Some(0.0));
    assert_eq!(
        rig.sink.count(|e| matches!(e, KilnEvent::ActuatorFault(_))),
        1
    );
}

#[test]
fn energy_and_cost_accumulate_while_heating() {
    let mut config = KilnConfig::default();
    config.element_power_kw = 3.6;
    config.kwh_rate = 0.5;
    let mut rig = Rig::new(config, MockKiln::steady(20.0));
    rig.start(flat(500.0, 3600.0));
    // First tick decides full duty; the next 500 ticks (1000 s) are spent at it.
    let mut s = StatusSnapshot::IDLE;
    for _ in 0..501 {
        s = rig.tick();
    }
    // 3.6 kW for 1000 s is 1 kWh.
    assert!((s.energy_kwh - 1.0).abs() < 0.01, "energy {}", s.energy_kwh);
    assert!((s.cost - 0.5).abs() < 0.01);
}

#[test]
fn start_offset_is_honoured() {
    let mut rig = Rig::new(KilnConfig::default(), MockKiln::steady(50.0));
    let profile = Profile::new(
        "ramp",
        vec![ProfilePoint::new(0.0, 0.0), ProfilePoint::new(1000.0, 100.0)],
    )
    .unwrap();
    rig.svc
        .handle_command(
            OvenCommand::Start {
                profile,
                start_at_secs: 500.0,
            },
            &mut rig.sink,
        )
        .unwrap();
    let s = rig.tick();
    assert!(s.profile_time >= 500.0);
    assert!((s.target - 50.0).abs() < 1.0);
}
