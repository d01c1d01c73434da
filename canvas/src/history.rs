//! Bounded redo history of locally undone elements.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::HISTORY_CAPACITY;
use crate::element::Element;

/// Stack of elements removed by undo, newest on top.
///
/// Past capacity the oldest entry is dropped. Committing a new element
/// clears it; undo and redo only push and pop.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<Element>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, element: Element) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(element);
    }

    /// Remove and return the most recently pushed element.
    pub fn pop(&mut self) -> Option<Element> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest (the next redo is last).
    pub fn entries(&self) -> impl Iterator<Item = &Element> {
        self.entries.iter()
    }
}
