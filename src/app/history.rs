//! Run history: a bounded backlog of status snapshots.
//!
//! Records snapshots while a run is active so an observer that connects
//! mid-run can be sent the curve so far. The backlog never drops the start
//! of a run: when it fills up, every other entry is discarded and only
//! every second snapshot is kept from then on, so a run of any length is
//! covered at a coarser spacing. [`RunHistory::subset`] thins the backlog
//! further to a fixed number of evenly spaced points.

use heapless::HistoryBuffer;

use super::events::{KilnEvent, StatusSnapshot};
use super::ports::EventSink;

/// Snapshots held per run. Must be even so that halving keeps the stored
/// ticks aligned to the new stride.
pub const HISTORY_DEPTH: usize = 4096;

pub struct RunHistory {
    buf: HistoryBuffer<StatusSnapshot, HISTORY_DEPTH>,
    /// Only every `stride`-th snapshot of the run is stored.
    stride: u64,
    /// Snapshots seen this run, stored or not.
    seen: u64,
    newest: Option<StatusSnapshot>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self {
            buf: HistoryBuffer::new(),
            stride: 1,
            seen: 0,
            newest: None,
        }
    }

    /// Stored snapshots.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.newest.is_none()
    }

    pub fn latest(&self) -> Option<&StatusSnapshot> {
        self.newest.as_ref()
    }

    /// Spacing, in snapshots, between stored entries.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// At most `max_points` snapshots, oldest first, evenly spaced over
    /// the run. The first and newest snapshots are always included.
    pub fn subset(&self, max_points: usize) -> Vec<StatusSnapshot> {
        let mut all: Vec<StatusSnapshot> = self.buf.oldest_ordered().copied().collect();
        if let Some(newest) = self.newest {
            if all.last().map(|s| s.tick) != Some(newest.tick) {
                all.push(newest);
            }
        }
        if max_points == 0 || all.is_empty() {
            return Vec::new();
        }
        if all.len() <= max_points {
            return all;
        }
        let last = all.len() - 1;
        if max_points == 1 {
            return vec![all[last]];
        }
        (0..max_points)
            .map(|i| all[i * last / (max_points - 1)])
            .collect()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.stride = 1;
        self.seen = 0;
        self.newest = None;
    }

    fn record(&mut self, snapshot: StatusSnapshot) {
        if self.seen % self.stride == 0 {
            if self.buf.len() == HISTORY_DEPTH {
                self.halve();
            }
            self.buf.write(snapshot);
        }
        self.seen += 1;
        self.newest = Some(snapshot);
    }

    /// Drop every other stored entry and double the stride.
    fn halve(&mut self) {
        let kept: Vec<StatusSnapshot> = self.buf.oldest_ordered().step_by(2).copied().collect();
        self.buf.clear();
        self.buf.extend_from_slice(&kept);
        self.stride *= 2;
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RunHistory {
    fn emit(&mut self, event: &KilnEvent) {
        match event {
            KilnEvent::ProfileStarted { .. } => self.clear(),
            KilnEvent::Status(s) if s.run_state.is_active() => self.record(*s),
            _ => {}
        }
    }
}
