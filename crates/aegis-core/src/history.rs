//! Bounded undo/redo history.

use std::collections::VecDeque;

use crate::AdjudicationStatus;

/// Default number of entries kept before the oldest is dropped.
pub const DEFAULT_CAPACITY: usize = 50;

/// A recorded status transition for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub role_name: String,
    pub prev: AdjudicationStatus,
    pub next: AdjudicationStatus,
}

/// Linear undo/redo stack with a fixed capacity.
///
/// `cursor` counts applied entries; everything at or past it is redoable.
/// Recording a new entry discards the redo branch.
#[derive(Debug, Clone)]
pub struct UndoHistory<T> {
    entries: VecDeque<T>,
    cursor: usize,
    capacity: usize,
}

impl<T: Clone> Default for UndoHistory<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<T: Clone> UndoHistory<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, entry: T) {
        self.entries.truncate(self.cursor);
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len();
    }

    /// Step back, returning the entry to revert.
    pub fn undo(&mut self) -> Option<T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step forward, returning the entry to replay.
    pub fn redo(&mut self) -> Option<T> {
        let entry = self.entries.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
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

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
