//! Time-proportioned relay output.
//!
//! The element relay is driven from a dedicated worker thread so the
//! control loop never blocks on the on/off phases of a cycle. Each
//! [`set_duty`](HeaterOutput::set_duty) call replaces the plan: the
//! worker holds the pin high for `duty × cycle`, low for the remainder,
//! and repeats until the next command arrives.
//!
//! Dropping the output stops the worker and leaves the pin low.

use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::app::ports::HeaterOutput;
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DutyPlan {
    on: Duration,
    off: Duration,
}

impl DutyPlan {
    const IDLE: Self = Self {
        on: Duration::ZERO,
        off: Duration::ZERO,
    };

    fn new(duty: f32, cycle: Duration) -> Self {
        let duty = if duty.is_nan() { 0.0 } else { duty.clamp(0.0, 1.0) };
        let on = cycle.mul_f32(duty);
        Self {
            on,
            off: cycle.saturating_sub(on),
        }
    }
}

pub struct RelayOutput {
    tx: Option<Sender<DutyPlan>>,
    fault: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RelayOutput {
    /// Spawn the relay worker. The pin is driven low before returning
    /// control to the caller's first `set_duty`.
    pub fn new<P>(pin: P) -> Result<Self, ActuatorError>
    where
        P: OutputPin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let fault = Arc::new(AtomicBool::new(false));
        let worker_fault = Arc::clone(&fault);
        let worker = std::thread::Builder::new()
            .name("relay".into())
            .spawn(move || {
                RelayWorker {
                    pin,
                    level: None,
                    fault: worker_fault,
                }
                .run(rx)
            })
            .map_err(|e| {
                error!("Relay: worker spawn failed: {e}");
                ActuatorError::RelayStopped
            })?;
        info!("Relay: worker started");
        Ok(Self {
            tx: Some(tx),
            fault,
            worker: Some(worker),
        })
    }

    /// A pin write has failed since the worker started.
    pub fn is_faulted(&self) -> bool {
        self.fault.load(Ordering::Acquire)
    }
}

impl HeaterOutput for RelayOutput {
    fn set_duty(&mut self, duty: f32, cycle: Duration) -> Result<(), ActuatorError> {
        if self.is_faulted() {
            return Err(ActuatorError::RelayWriteFailed);
        }
        let tx = self.tx.as_ref().ok_or(ActuatorError::RelayStopped)?;
        tx.send(DutyPlan::new(duty, cycle))
            .map_err(|_| ActuatorError::RelayStopped)
    }
}

impl Drop for RelayOutput {
    fn drop(&mut self) {
        // Closing the channel is the stop signal.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Relay: worker panicked");
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// Worker
// ═══════════════════════════════════════════════════════════════

struct RelayWorker<P> {
    pin: P,
    level: Option<bool>,
    fault: Arc<AtomicBool>,
}

impl<P: OutputPin> RelayWorker<P> {
    fn run(mut self, rx: Receiver<DutyPlan>) {
        self.drive(false);
        let mut plan = DutyPlan::IDLE;
        loop {
            match self.cycle(plan, &rx) {
                Ok(Some(next)) => plan = next,
                Ok(None) => {}
                Err(()) => break,
            }
        }
        self.drive(false);
        info!("Relay: worker stopped");
    }

    /// One on/off cycle. Returns the plan that interrupted it, `None`
    /// when the cycle ran to completion, or `Err` once the sender is gone.
    fn cycle(&mut self, plan: DutyPlan, rx: &Receiver<DutyPlan>) -> Result<Option<DutyPlan>, ()> {
        if plan.on.is_zero() {
            self.drive(false);
            return rx.recv().map(Some).map_err(|_| ());
        }
        self.drive(true);
        if let Some(next) = wait(rx, plan.on)? {
            return Ok(Some(next));
        }
        if plan.off.is_zero() {
            return Ok(None);
        }
        self.drive(false);
        wait(rx, plan.off)
    }

    fn drive(&mut self, high: bool) {
        if self.level == Some(high) {
            return;
        }
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.level = Some(high),
            Err(e) => {
                if !self.fault.swap(true, Ordering::AcqRel) {
                    warn!("Relay: pin write failed: {e:?}");
                }
                self.level = None;
                if high {
                    // Best effort: never leave the element latched on.
                    let _ = self.pin.set_low();
                }
            }
        }
    }
}

fn wait(rx: &Receiver<DutyPlan>, dur: Duration) -> Result<Option<DutyPlan>, ()> {
    match rx.recv_timeout(dur) {
        Ok(next) => Ok(Some(next)),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(()),
    }
}
