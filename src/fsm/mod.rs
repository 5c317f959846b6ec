//! Function-pointer state machine for the kiln run state.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌──────────┬──────────┬─────────┬─────────────────────────┐  │
//! │  │ State    │ on_enter │ on_exit │ on_update               │  │
//! │  ├──────────┼──────────┼─────────┼─────────────────────────┤  │
//! │  │ Idle     │ fn(ctx)  │ -       │ fn(ctx)->Option<Trigger>│  │
//! │  │ Running  │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option<Trigger>│  │
//! │  │ Paused   │ fn(ctx)  │ -       │ fn(ctx)->Option<Trigger>│  │
//! │  │ Complete │ fn(ctx)  │ -       │ fn(ctx)->Option<Trigger>│  │
//! │  │ Aborted  │ fn(ctx)  │ -       │ fn(ctx)->Option<Trigger>│  │
//! │  └──────────┴──────────┴─────────┴─────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every state change goes through [`next_state`], so an illegal
//! transition cannot be performed, only rejected. Triggers come from two
//! places: external commands (via [`Fsm::fire`]) and the per-tick
//! `on_update` handlers (completion, emergency abort).

pub mod context;
pub mod states;

use context::FsmContext;
use log::{info, warn};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Run state and triggers
// ---------------------------------------------------------------------------

/// Run state of the kiln. Indexes the state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OvenRunState {
    Idle = 0,
    Running = 1,
    Paused = 2,
    Complete = 3,
    Aborted = 4,
}

impl OvenRunState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 5;

    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Paused,
            3 => Self::Complete,
            4 => Self::Aborted,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Aborted
            }
        }
    }

    /// A run is in progress (element may be driven or is held off by pause).
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Only left through an explicit reset.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }
}

/// Events that move the run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Start,
    Pause,
    Resume,
    Complete,
    Abort,
    Reset,
}

/// The transition function. `None` means the trigger is illegal in `from`.
pub fn next_state(from: OvenRunState, trigger: Trigger) -> Option<OvenRunState> {
    use OvenRunState::{Aborted, Complete, Idle, Paused, Running};
    match (from, trigger) {
        (Idle, Trigger::Start) => Some(Running),
        (Running, Trigger::Pause) => Some(Paused),
        (Paused, Trigger::Resume) => Some(Running),
        (Running, Trigger::Complete) => Some(Complete),
        (Running | Paused, Trigger::Abort) => Some(Aborted),
        (Complete | Aborted, Trigger::Reset) => Some(Idle),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick update handler. Returns `Some(trigger)` to request a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<Trigger>;

/// One row in the state table.
pub struct StateDescriptor {
    pub id: OvenRunState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// A completed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OvenRunState,
    pub to: OvenRunState,
    pub trigger: Trigger,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `OvenRunState as usize`.
    table: [StateDescriptor; OvenRunState::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; OvenRunState::COUNT], initial: OvenRunState) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`. Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run the current state's `on_update` and apply any trigger it returns.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> Option<Transition> {
        self.tick_count += 1;

        let trigger = (self.table[self.current].on_update)(ctx)?;
        match self.fire(trigger, ctx) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("FSM: update handler requested {e}");
                None
            }
        }
    }

    /// Apply `trigger` through the transition function.
    pub fn fire(&mut self, trigger: Trigger, ctx: &mut FsmContext) -> Result<Transition> {
        let from = self.current_state();
        let to = next_state(from, trigger).ok_or(Error::InvalidTransition { from, trigger })?;
        self.transition(to, ctx);
        Ok(Transition { from, to, trigger })
    }

    pub fn current_state(&self) -> OvenRunState {
        OvenRunState::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: OvenRunState, ctx: &mut FsmContext) {
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
