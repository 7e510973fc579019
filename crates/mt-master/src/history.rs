//! Bounded undo/redo over automation snapshots.

use std::collections::VecDeque;

use mt_ir::Snapshot;

/// Linear history of snapshots with a cursor on the current one.
///
/// Saving after an undo discards the redo future. When the stack is full the
/// oldest snapshot is evicted.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<Snapshot>,
    position: usize,
    capacity: usize,
    restoring: bool,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::new(), position: 0, capacity: capacity.max(1), restoring: false }
    }

    /// Record a snapshot. Ignored while a snapshot is being restored.
    pub fn save(&mut self, snapshot: Snapshot) -> bool {
        if self.restoring {
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.position + 1);
        }
        self.entries.push_back(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.position = self.entries.len() - 1;
        true
    }

    /// Step back; returns the snapshot to load, or None at the oldest entry.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.position -= 1;
        self.entries.get(self.position)
    }

    /// Step forward; returns the snapshot to load, or None at the newest entry.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.position += 1;
        self.entries.get(self.position)
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Suppress saving while a snapshot is being applied.
    pub fn set_restoring(&mut self, restoring: bool) {
        self.restoring = restoring;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = 0;
    }
}
