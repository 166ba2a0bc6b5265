//! Fixed-capacity store of completed poll snapshots.

use std::collections::VecDeque;

use serde::Serialize;

use super::poll::PollSnapshot;

/// Number of completed polls retained; oldest evicted first.
pub const HISTORY_CAPACITY: usize = 50;

/// Ring buffer of completed poll snapshots. Unlike the chat log this
/// is read newest-first, as a history list.
#[derive(Debug, Default, Serialize)]
pub struct PollHistory {
    entries: VecDeque<PollSnapshot>,
}

impl PollHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, snapshot: PollSnapshot) {
        self.entries.push_front(snapshot);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Latest `n` snapshots, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &PollSnapshot> {
        self.entries.iter().take(n)
    }

    pub fn latest(&self) -> Option<&PollSnapshot> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
