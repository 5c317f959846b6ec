//! Fixed-period control loop.
//!
//! Runs on its own thread. Each iteration drains the command mailbox,
//! runs one [`KilnService::tick`] with the clock's measured time, publishes
//! the snapshot, then sleeps for whatever remains of the period. An
//! iteration that takes longer than the period is logged and the next one
//! starts immediately; the service sees the real elapsed time either way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::link::ControlLink;
use super::ports::{ClockPort, EventSink, HeaterOutput, TemperatureSource};
use super::service::KilnService;

/// Wall-clock length of one iteration: the tick period divided by the
/// simulation speed when simulating.
pub fn loop_period(service: &KilnService) -> Duration {
    let config = service.config();
    let period = config.tick_period();
    if config.simulated && config.simulate.speed > 0.0 {
        period.div_f32(config.simulate.speed)
    } else {
        period
    }
}

/// Drive `service` until `stop` is set. The element is turned off on exit.
pub fn run_control_loop(
    service: &mut KilnService,
    hw: &mut (impl TemperatureSource + HeaterOutput),
    link: &ControlLink,
    clock: &impl ClockPort,
    sink: &mut impl EventSink,
    stop: &AtomicBool,
) {
    let period = loop_period(service);
    info!("Control loop running, period {:?}", period);

    while !stop.load(Ordering::Relaxed) {
        let started = Instant::now();

        while let Some(cmd) = link.try_next_command() {
            if let Err(e) = service.handle_command(cmd, sink) {
                debug!("Command not applied: {e}");
            }
        }

        let snapshot = service.tick(clock.uptime_us(), hw, sink);
        link.publish(snapshot);

        let busy = started.elapsed();
        if busy > period {
            warn!(
                "Tick {} overran: {:?} > {:?}",
                snapshot.tick, busy, period
            );
        } else {
            std::thread::sleep(period - busy);
        }
    }

    info!("Control loop stopping, element off");
    if let Err(e) = hw.set_duty(0.0, service.config().tick_period()) {
        warn!("Could not turn element off on exit: {e}");
    }
}
