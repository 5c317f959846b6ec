//! State handler functions and table builder.
//!
//! ```text
//!  IDLE ──[start]──▶ RUNNING ──[pause]──▶ PAUSED
//!    ▲                 │  ▲                 │
//!    │                 │  └────[resume]─────┤
//!    │           [complete]                 │
//!    │                 ▼                    │
//!    ├──[reset]── COMPLETE                  │
//!    │                                      │
//!    └──[reset]── ABORTED ◀──[abort]────────┘ (and from RUNNING)
//! ```
//!
//! Every state except Running forces the duty to zero on entry and on each
//! update.

use log::{info, warn};

use super::context::FsmContext;
use super::{OvenRunState, StateDescriptor, Trigger};
use crate::app::events::AbortReason;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Called once per service.
pub fn build_state_table() -> [StateDescriptor; OvenRunState::COUNT] {
    [
        StateDescriptor {
            id: OvenRunState::Idle,
            name: "Idle",
            on_enter: Some(element_off),
            on_exit: None,
            on_update: idle_update,
        },
        StateDescriptor {
            id: OvenRunState::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: Some(running_exit),
            on_update: running_update,
        },
        StateDescriptor {
            id: OvenRunState::Paused,
            name: "Paused",
            on_enter: Some(paused_enter),
            on_exit: None,
            on_update: paused_update,
        },
        StateDescriptor {
            id: OvenRunState::Complete,
            name: "Complete",
            on_enter: Some(complete_enter),
            on_exit: None,
            on_update: terminal_update,
        },
        StateDescriptor {
            id: OvenRunState::Aborted,
            name: "Aborted",
            on_enter: Some(aborted_enter),
            on_exit: None,
            on_update: terminal_update,
        },
    ]
}

fn element_off(ctx: &mut FsmContext) {
    ctx.duty = 0.0;
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut FsmContext) -> Option<Trigger> {
    // Monitoring only; starting is an external command.
    element_off(ctx);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut FsmContext) {
    ctx.abort_reason = None;
    info!("RUNNING: element under PID control");
}

fn running_exit(ctx: &mut FsmContext) {
    element_off(ctx);
}

fn running_update(ctx: &mut FsmContext) -> Option<Trigger> {
    if let Some(reason) = ctx.shutdown {
        ctx.abort_reason = Some(AbortReason::Emergency(reason));
        return Some(Trigger::Abort);
    }
    if ctx.step.is_some_and(|s| s.complete) {
        return Some(Trigger::Complete);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PAUSED
// ═══════════════════════════════════════════════════════════════════════════

fn paused_enter(ctx: &mut FsmContext) {
    element_off(ctx);
    info!("PAUSED: element off, profile time held");
}

fn paused_update(ctx: &mut FsmContext) -> Option<Trigger> {
    element_off(ctx);
    if let Some(reason) = ctx.shutdown {
        ctx.abort_reason = Some(AbortReason::Emergency(reason));
        return Some(Trigger::Abort);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COMPLETE / ABORTED
// ═══════════════════════════════════════════════════════════════════════════

fn complete_enter(ctx: &mut FsmContext) {
    element_off(ctx);
    info!("COMPLETE: profile finished");
}

fn aborted_enter(ctx: &mut FsmContext) {
    element_off(ctx);
    match ctx.abort_reason {
        Some(reason) => warn!("ABORTED: {reason}"),
        None => warn!("ABORTED"),
    }
}

fn terminal_update(ctx: &mut FsmContext) -> Option<Trigger> {
    element_off(ctx);
    None
}
