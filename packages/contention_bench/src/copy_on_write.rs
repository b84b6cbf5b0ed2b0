use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::SharedContainer;

/// A copy-on-write sequence.
///
/// Readers load the current snapshot without locking. Every write copies the whole sequence,
/// modifies the copy and publishes it, so writes are expensive and serialize on a writer lock
/// while reads scale freely.
#[derive(Debug)]
pub struct CopyOnWriteVec {
    current: ArcSwap<Vec<i32>>,
    writer: Mutex<()>,
}

impl CopyOnWriteVec {
    /// Creates the sequence holding a copy of `initial`.
    #[must_use]
    pub fn new(initial: &[i32]) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial.to_vec()),
            writer: Mutex::new(()),
        }
    }
}

impl SharedContainer for CopyOnWriteVec {
    fn get(&self, index: usize) -> Option<i32> {
        self.current.load().get(index).copied()
    }

    fn set(&self, index: usize, value: i32) {
        let _writer = self.writer.lock();

        let mut next = Vec::clone(&self.current.load());
        let len = next.len();

        let slot = next
            .get_mut(index)
            .unwrap_or_else(|| panic!("index {index} out of bounds for sequence of {len}"));
        *slot = value;

        self.current.store(Arc::new(next));
    }

    fn len(&self) -> usize {
        self.current.load().len()
    }
}
