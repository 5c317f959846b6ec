//! Full firings against the thermal model, on a manual clock.

use kilnctl::adapters::simulated::SimulatedKiln;
use kilnctl::app::commands::OvenCommand;
use kilnctl::app::events::KilnEvent;
use kilnctl::app::history::RunHistory;
use kilnctl::app::ports::ClockPort;
use kilnctl::app::service::KilnService;
use kilnctl::config::KilnConfig;
use kilnctl::fsm::OvenRunState;
use kilnctl::profile::{Profile, ProfilePoint};

use crate::mock_hw::{ManualClock, RecordingSink};

#[test]
fn simulated_firing_follows_profile_to_completion() {
    let mut config = KilnConfig::default();
    config.simulated = true;
    let clock = ManualClock::default();
    let mut kiln = SimulatedKiln::new(config.simulate.clone(), clock.clone());
    let mut svc = KilnService::new(config).unwrap();
    let mut history = RunHistory::new();
    let mut events = RecordingSink::new();

    let profile = Profile::new(
        "test-fire",
        vec![
            ProfilePoint::new(0.0, 21.0),
            ProfilePoint::new(600.0, 100.0),
            ProfilePoint::new(900.0, 100.0),
        ],
    )
    .unwrap();
    svc.handle_command(
        OvenCommand::Start {
            profile,
            start_at_secs: 0.0,
        },
        &mut (&mut history, &mut events),
    )
    .unwrap();

    let mut max_c = f32::MIN;
    for _ in 0..3000 {
        let s = svc.tick(clock.uptime_us(), &mut kiln, &mut (&mut history, &mut events));
        clock.advance_secs(2.0);
        if let Some(c) = s.celsius() {
            max_c = max_c.max(c);
        }
        if s.run_state != OvenRunState::Running {
            break;
        }
    }

    assert_eq!(svc.state(), OvenRunState::Complete);
    let final_c = svc.snapshot().celsius().unwrap();
    assert!((final_c - 100.0).abs() <= 10.0, "finished at {final_c}");
    assert!(max_c < 150.0, "overshot to {max_c}");
    assert!(svc.snapshot().energy_kwh > 0.0);
    assert_eq!(
        events.count(|e| matches!(e, KilnEvent::ProfileCompleted { .. })),
        1
    );

    // History holds the run, oldest first, and thins on request.
    assert!(history.len() > 400);
    let curve = history.subset(10);
    assert_eq!(curve.len(), 10);
    assert!(curve.windows(2).all(|w| w[0].tick < w[1].tick));
}

#[test]
fn idle_kiln_stays_at_ambient() {
    let config = KilnConfig::default();
    let clock = ManualClock::default();
    let mut kiln = SimulatedKiln::new(config.simulate.clone(), clock.clone());
    let ambient = config.simulate.t_env;
    let mut svc = KilnService::new(config).unwrap();
    let mut events = RecordingSink::new();

    for _ in 0..100 {
        svc.tick(clock.uptime_us(), &mut kiln, &mut events);
        clock.advance_secs(2.0);
    }
    let c = svc.snapshot().celsius().unwrap();
    assert!((c - ambient).abs() < 1e-3);
    assert_eq!(kiln.duty(), 0.0);
}
