//! Kiln service: the hexagonal core.
//!
//! [`KilnService`] owns the run state machine, emergency monitor, PID
//! controller and profile scheduler. It is the only writer of the heater
//! duty. All I/O flows through port traits injected at call sites, so the
//! whole service runs against mock adapters in tests.
//!
//! ```text
//!  TemperatureSource ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                        │         KilnService          │
//!       HeaterOutput ◀── │ Monitor · Scheduler · PID · FSM │
//!                        └──────────────────────────────┘
//! ```
//!
//! Per tick: sample → emergency check → (Running only) schedule + PID →
//! FSM update → apply duty → publish status.

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::config::KilnConfig;
use crate::control::pid::{PidController, PidStats};
use crate::error::{Error, Result};
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, OvenRunState, Transition, Trigger};
use crate::profile::Profile;
use crate::safety::{EmergencyMonitor, EmergencyVerdict};
use crate::scheduler::ProfileScheduler;
use crate::sensors::TemperatureReading;

use super::commands::OvenCommand;
use super::events::{AbortReason, KilnEvent, StatusSnapshot};
use super::ports::{EventSink, HeaterOutput, TemperatureSource};

// ───────────────────────────────────────────────────────────────
// KilnService
// ───────────────────────────────────────────────────────────────

pub struct KilnService {
    config: KilnConfig,
    fsm: Fsm,
    ctx: FsmContext,
    monitor: EmergencyMonitor,
    pid: PidController,
    /// Present from Start until Reset.
    scheduler: Option<ProfileScheduler>,
    /// Relay cycle length handed to the output each tick.
    cycle: Duration,
    last_tick_us: Option<u64>,
    last_reading: Option<TemperatureReading>,
    last_verdict: EmergencyVerdict,
    /// Duty that was live during the interval ending at this tick.
    applied_duty: f32,
    energy_kwh: f32,
    tick_count: u64,
    snapshot: StatusSnapshot,
}

impl KilnService {
    /// Validate `config` and build an idle service.
    pub fn new(config: KilnConfig) -> Result<Self> {
        config.validate()?;

        let mut ctx = FsmContext::new();
        let mut fsm = Fsm::new(build_state_table(), OvenRunState::Idle);
        fsm.start(&mut ctx);

        info!(
            "KilnService: tick {:.2}s, window {:.1}, shutoff {:.0}\u{00b0}C, catch-up {}",
            config.sensor_time_wait,
            config.pid_control_window,
            config.emergency_shutoff_temp,
            config.kiln_must_catch_up
        );
        if config.ignore_emergencies {
            warn!("ignore_emergencies is set: shutdown verdicts will be reported but not acted on");
        }

        Ok(Self {
            monitor: EmergencyMonitor::new(&config),
            pid: PidController::new(&config),
            cycle: config.tick_period(),
            config,
            fsm,
            ctx,
            scheduler: None,
            last_tick_us: None,
            last_reading: None,
            last_verdict: EmergencyVerdict::Safe,
            applied_duty: 0.0,
            energy_kwh: 0.0,
            tick_count: 0,
            snapshot: StatusSnapshot::IDLE,
        })
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle at monotonic time `now_us`.
    ///
    /// `hw` satisfies both [`TemperatureSource`] and [`HeaterOutput`],
    /// which avoids a double mutable borrow while keeping the port
    /// boundary explicit.
    pub fn tick(
        &mut self,
        now_us: u64,
        hw: &mut (impl TemperatureSource + HeaterOutput),
        sink: &mut impl EventSink,
    ) -> StatusSnapshot {
        self.tick_count += 1;
        let dt = match self.last_tick_us {
            Some(prev) => now_us.saturating_sub(prev) as f32 / 1_000_000.0,
            None => self.config.sensor_time_wait,
        };
        self.last_tick_us = Some(now_us);

        let state = self.fsm.current_state();
        self.ctx.begin_tick();

        // 1. Sample
        let reading = hw.sample();
        let previous_fault = self.last_reading.and_then(|r| r.fault());
        self.ctx.reading = Some(reading);
        self.last_reading = Some(reading);
        if let Some(kind) = reading.fault() {
            if previous_fault != Some(kind) {
                sink.emit(&KilnEvent::SensorFault(kind));
            }
        }

        // 2. Emergency check, in every state
        let verdict = self.monitor.check(&reading, state);
        self.last_verdict = verdict;
        if let EmergencyVerdict::ShutdownRequested(reason) = verdict {
            if state.is_active() {
                if self.config.ignore_emergencies {
                    warn!("Emergency '{reason}' ignored, run continues");
                    sink.emit(&KilnEvent::EmergencyIgnored(reason));
                } else {
                    error!("Emergency shutdown: {reason}");
                    self.ctx.shutdown = Some(reason);
                    sink.emit(&KilnEvent::EmergencyShutdown(reason));
                }
            }
        }

        // 3. Profile + PID while Running
        if state == OvenRunState::Running && self.ctx.shutdown.is_none() {
            if let Some(scheduler) = self.scheduler.as_mut() {
                let step = scheduler.advance(&reading, dt);
                self.ctx.step = Some(step);
                if !step.complete {
                    // No valid temperature: element off for this tick.
                    self.ctx.duty = match reading.celsius() {
                        Some(t) => self.pid.compute(step.target, t, dt),
                        None => 0.0,
                    };
                    let stats = self.pid.stats();
                    debug!(
                        "PID: err {:.1} p {:.3} i {:.3} d {:.3} -> {:.2}",
                        stats.error, stats.p, stats.i, stats.d, stats.output
                    );
                }
            }
        }

        // 4. FSM (completion, emergency abort, duty forced off outside Running)
        if let Some(t) = self.fsm.tick(&mut self.ctx) {
            self.on_transition(t, sink);
        }

        // 5. Apply
        self.apply_duty(hw, sink);

        // 6. Accounting and status
        self.energy_kwh += self.applied_duty * self.config.element_power_kw * dt / 3600.0;
        self.applied_duty = self.ctx.duty;
        self.refresh_snapshot();
        sink.emit(&KilnEvent::Status(self.snapshot));
        self.snapshot
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply a command between ticks. Rejected commands leave the state
    /// unchanged and are reported as [`KilnEvent::CommandRejected`].
    pub fn handle_command(&mut self, cmd: OvenCommand, sink: &mut impl EventSink) -> Result<()> {
        let result = match cmd {
            OvenCommand::Start {
                profile,
                start_at_secs,
            } => self.start(profile, start_at_secs, sink),
            OvenCommand::Pause => self.fire(Trigger::Pause, sink),
            OvenCommand::Resume => {
                let r = self.fire(Trigger::Resume, sink);
                if r.is_ok() {
                    self.pid.reset();
                }
                r
            }
            OvenCommand::Abort => {
                if self.fsm.current_state().is_active() {
                    self.ctx.abort_reason = Some(AbortReason::Operator);
                    self.fire(Trigger::Abort, sink)
                } else {
                    debug!("Abort while {:?}: nothing to do", self.fsm.current_state());
                    Ok(())
                }
            }
            OvenCommand::Reset => self.fire(Trigger::Reset, sink),
        };

        if let Err(e) = result {
            warn!("Command rejected: {e}");
            sink.emit(&KilnEvent::CommandRejected(e));
        }
        self.refresh_snapshot();
        result
    }

    fn start(&mut self, profile: Profile, start_at_secs: f32, sink: &mut impl EventSink) -> Result<()> {
        let state = self.fsm.current_state();
        if state != OvenRunState::Idle {
            return Err(Error::InvalidTransition {
                from: state,
                trigger: Trigger::Start,
            });
        }
        if let Some(kind) = self.last_reading.and_then(|r| r.fault()) {
            return Err(Error::Sensor(kind));
        }

        let scheduler = ProfileScheduler::new(profile, &self.config, start_at_secs);
        let name = scheduler.profile().name().to_owned();
        let duration_secs = scheduler.profile().duration_secs();
        let start_at_secs = scheduler.profile_time();

        self.fire(Trigger::Start, sink)?;
        self.scheduler = Some(scheduler);
        self.pid.reset();
        self.energy_kwh = 0.0;

        info!("Starting profile '{name}' ({duration_secs:.0}s) at {start_at_secs:.0}s");
        sink.emit(&KilnEvent::ProfileStarted {
            name,
            duration_secs,
            start_at_secs,
        });
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Status as of the last tick or command.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot
    }

    pub fn state(&self) -> OvenRunState {
        self.fsm.current_state()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.scheduler.as_ref().map(ProfileScheduler::profile)
    }

    // ── Internal ──────────────────────────────────────────────

    fn fire(&mut self, trigger: Trigger, sink: &mut impl EventSink) -> Result<()> {
        let t = self.fsm.fire(trigger, &mut self.ctx)?;
        self.on_transition(t, sink);
        Ok(())
    }

    fn on_transition(&mut self, t: Transition, sink: &mut impl EventSink) {
        sink.emit(&KilnEvent::StateChanged {
            from: t.from,
            to: t.to,
        });
        match t.to {
            OvenRunState::Complete => {
                if let Some(s) = &self.scheduler {
                    info!(
                        "Profile '{}' complete ({:.0}s held for catch-up, {:.2} kWh)",
                        s.profile().name(),
                        s.catch_up_secs(),
                        self.energy_kwh
                    );
                    sink.emit(&KilnEvent::ProfileCompleted {
                        name: s.profile().name().to_owned(),
                        catch_up_secs: s.catch_up_secs(),
                        energy_kwh: self.energy_kwh,
                    });
                }
                self.pid.reset();
            }
            OvenRunState::Aborted | OvenRunState::Paused => self.pid.reset(),
            OvenRunState::Idle => self.scheduler = None,
            OvenRunState::Running => {}
        }
    }

    /// Hand the tick's duty to the output. A failed write aborts the run
    /// and makes a best-effort attempt to leave the element off.
    fn apply_duty(&mut self, hw: &mut impl HeaterOutput, sink: &mut impl EventSink) {
        let Err(e) = hw.set_duty(self.ctx.duty, self.cycle) else {
            return;
        };
        error!("Heater output failed: {e}");
        sink.emit(&KilnEvent::ActuatorFault(e));
        if self.fsm.current_state().is_active() {
            self.ctx.abort_reason = Some(AbortReason::Actuator(e));
            if let Err(fe) = self.fire(Trigger::Abort, sink) {
                warn!("Abort after output failure rejected: {fe}");
            }
        }
        self.ctx.duty = 0.0;
        if let Err(e) = hw.set_duty(0.0, self.cycle) {
            error!("Heater output still failing: {e}");
        }
    }

    fn refresh_snapshot(&mut self) {
        let (target, profile_time, profile_duration, catching_up, catch_up_secs) =
            match &self.scheduler {
                Some(s) => (
                    self.ctx
                        .step
                        .map_or_else(|| s.profile().target_at(s.profile_time()), |st| st.target),
                    s.profile_time(),
                    s.profile().duration_secs(),
                    self.ctx.step.is_some_and(|st| st.catching_up),
                    s.catch_up_secs(),
                ),
                None => (0.0, 0.0, 0.0, false, 0.0),
            };

        let run_state = self.fsm.current_state();
        self.snapshot = StatusSnapshot {
            run_state,
            reading: self.last_reading,
            target,
            duty: self.ctx.duty,
            profile_time,
            profile_duration,
            catching_up,
            catch_up_secs,
            pid: if run_state == OvenRunState::Running {
                self.pid.stats()
            } else {
                PidStats::ZERO
            },
            last_verdict: self.last_verdict,
            abort_reason: self.ctx.abort_reason,
            tick: self.tick_count,
            energy_kwh: self.energy_kwh,
            cost: self.energy_kwh * self.config.kwh_rate,
        };
    }
}
