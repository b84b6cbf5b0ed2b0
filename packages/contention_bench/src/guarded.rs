//! Plain standard library containers made thread-safe by wrapping them in one mutex.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::SharedContainer;

/// A `Vec` behind a mutex. Readers and writers all serialize on the same lock.
#[derive(Debug)]
pub struct GuardedVec {
    items: Mutex<Vec<i32>>,
}

impl GuardedVec {
    /// Creates the sequence holding a copy of `initial`.
    #[must_use]
    pub fn new(initial: &[i32]) -> Self {
        Self {
            items: Mutex::new(initial.to_vec()),
        }
    }
}

impl SharedContainer for GuardedVec {
    fn get(&self, index: usize) -> Option<i32> {
        self.items.lock().get(index).copied()
    }

    fn set(&self, index: usize, value: i32) {
        let mut items = self.items.lock();
        let len = items.len();

        let slot = items
            .get_mut(index)
            .unwrap_or_else(|| panic!("index {index} out of bounds for sequence of {len}"));
        *slot = value;
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }
}

/// A `HashMap` keyed by index behind a mutex.
#[derive(Debug)]
pub struct GuardedMap {
    entries: Mutex<HashMap<usize, i32>>,
}

impl GuardedMap {
    /// Creates the map with `initial[i]` stored under key `i`.
    #[must_use]
    pub fn new(initial: &[i32]) -> Self {
        Self {
            entries: Mutex::new(initial.iter().copied().enumerate().collect()),
        }
    }
}

impl SharedContainer for GuardedMap {
    fn get(&self, index: usize) -> Option<i32> {
        self.entries.lock().get(&index).copied()
    }

    fn set(&self, index: usize, value: i32) {
        self.entries.lock().insert(index, value);
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
