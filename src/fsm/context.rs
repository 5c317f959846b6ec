//! Shared mutable context threaded through every FSM handler.
//!
//! The service fills in the tick's reading, schedule step and computed duty
//! before calling [`Fsm::tick`](super::Fsm::tick); the handlers read them to
//! decide on transitions and force the duty to zero whenever the element
//! must be off.

use crate::app::events::AbortReason;
use crate::error::ShutdownReason;
use crate::scheduler::ScheduleStep;
use crate::sensors::TemperatureReading;

#[derive(Debug, Default)]
pub struct FsmContext {
    // -- Inputs for this tick --
    pub reading: Option<TemperatureReading>,
    /// Set only while Running and no shutdown is pending.
    pub step: Option<ScheduleStep>,
    /// Shutdown the service has decided to act on.
    pub shutdown: Option<ShutdownReason>,

    // -- Outputs --
    /// Duty fraction to apply after the FSM tick.
    pub duty: f32,
    /// Why the last run ended in `Aborted`.
    pub abort_reason: Option<AbortReason>,
}

impl FsmContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the per-tick inputs before the next tick is assembled.
    pub fn begin_tick(&mut self) {
        self.reading = None;
        self.step = None;
        self.shutdown = None;
        self.duty = 0.0;
    }
}
