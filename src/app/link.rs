//! Command mailbox and status cell shared with the control thread.
//!
//! Uses `embassy-sync` primitives so a `ControlLink` can live in a
//! `static` without heap allocation:
//!
//! ```text
//! ┌──────────────┐  OvenCommand   ┌──────────────┐
//! │  Console /   │──────────────▶│ Control loop │
//! │  API handler │◀──────────────│  (periodic)  │
//! └──────────────┘ StatusSnapshot └──────────────┘
//! ```
//!
//! Commands are drained only at the top of a tick. Status readers copy the
//! snapshot out under a critical section and never wait on the loop.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::commands::OvenCommand;
use super::events::StatusSnapshot;
use crate::error::{Error, Result};

/// Channel depth for pending commands.
pub const COMMAND_DEPTH: usize = 8;

pub struct ControlLink {
    commands: Channel<CriticalSectionRawMutex, OvenCommand, COMMAND_DEPTH>,
    status: Mutex<CriticalSectionRawMutex, Cell<StatusSnapshot>>,
}

impl ControlLink {
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            status: Mutex::new(Cell::new(StatusSnapshot::IDLE)),
        }
    }

    /// Queue a command for the next tick. Fails if the mailbox is full.
    pub fn send(&self, cmd: OvenCommand) -> Result<()> {
        self.commands.try_send(cmd).map_err(|_| {
            warn!("Command mailbox full, dropping command");
            Error::MailboxFull
        })
    }

    /// Next pending command, if any. Control loop only.
    pub fn try_next_command(&self) -> Option<OvenCommand> {
        self.commands.try_receive().ok()
    }

    /// Replace the published snapshot. Control loop only.
    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.status.lock(|cell| cell.set(snapshot));
    }

    /// Copy of the latest published snapshot.
    pub fn status(&self) -> StatusSnapshot {
        self.status.lock(Cell::get)
    }
}

impl Default for ControlLink {
    fn default() -> Self {
        Self::new()
    }
}
