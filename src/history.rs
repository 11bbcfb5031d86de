//! Bounded undo/redo over whole-state snapshots.
//!
//! Snapshots are cheap to hold because [`crate::tree::Forest`] shares
//! untouched entries between versions.

use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Double stack of past and future states
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    capacity: usize,
}

impl<T: Clone> HistoryStack<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Capacity bounds `past`; a capacity of zero disables undo.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            future: Vec::new(),
            capacity,
        }
    }

    /// Push the state from before a change; clears the redo branch.
    pub fn record(&mut self, previous: T) {
        self.future.clear();
        if self.capacity == 0 {
            return;
        }
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(previous);
    }

    /// Step back: `current` goes onto the redo stack and the prior state is returned.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        if self.past.len() > self.capacity {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> Default for HistoryStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_symmetry() {
        let mut history = HistoryStack::new();
        let mut state = 0;
        for next in 1..=3 {
            history.record(state);
            state = next;
        }

        state = history.undo(state).unwrap();
        assert_eq!(state, 2);
        state = history.undo(state).unwrap();
        assert_eq!(state, 1);
        state = history.redo(state).unwrap();
        assert_eq!(state, 2);
        state = history.redo(state).unwrap();
        assert_eq!(state, 3);
        assert!(history.redo(state).is_none());
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = HistoryStack::new();
        history.record("a");
        let state = history.undo("b").unwrap();
        assert!(history.can_redo());
        history.record(state);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = HistoryStack::with_capacity(DEFAULT_HISTORY_CAPACITY);
        for i in 0..60 {
            history.record(i);
        }
        assert_eq!(history.undo_depth(), DEFAULT_HISTORY_CAPACITY);

        let mut state = 60;
        let mut oldest = state;
        while let Some(prev) = history.undo(state) {
            oldest = prev;
            state = prev;
        }
        assert_eq!(oldest, 10);
    }

    #[test]
    fn test_zero_capacity_never_undoes() {
        let mut history = HistoryStack::with_capacity(0);
        history.record(1);
        assert!(!history.can_undo());
        assert!(history.undo(2).is_none());
    }
}
