use std::collections::VecDeque;

use crate::list::AnnotationList;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded stack of committed annotation states.
///
/// Snapshots are persistent lists, so pushing shares structure with the
/// previous state. When full, the oldest snapshot is evicted.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<AnnotationList>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn push(&mut self, state: AnnotationList) {
        self.snapshots.push_back(state);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    /// Drops the latest snapshot and returns the state to restore: the
    /// snapshot before it, or an empty sequence when none is left. `None`
    /// when there is nothing to undo.
    pub fn undo(&mut self) -> Option<AnnotationList> {
        self.snapshots.pop_back()?;
        Some(self.snapshots.back().cloned().unwrap_or_default())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
