//! Inbound commands to the kiln service.
//!
//! Sent by the outside world (console, API handler) through the
//! [`ControlLink`](super::link::ControlLink) mailbox and applied by the
//! control loop between ticks.

use crate::profile::Profile;

#[derive(Debug, Clone)]
pub enum OvenCommand {
    /// Begin firing `profile`, `start_at_secs` into the curve.
    Start { profile: Profile, start_at_secs: f32 },

    Pause,

    Resume,

    /// Stop the run and turn the element off. No-op when nothing is running.
    Abort,

    /// Return from Complete or Aborted to Idle.
    Reset,
}
