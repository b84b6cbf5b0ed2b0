use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use crate::Accumulate;
use crate::strategy::next_index;

/// Accumulator without any coordination between threads.
///
/// Each field is read and written with independent relaxed loads and stores, which compile to
/// plain memory accesses. There is no read-modify-write step, so concurrent writers overwrite
/// each other's progress and the total drifts from the reference. This is the floor the other
/// strategies are compared against.
#[derive(Debug)]
pub struct Baseline {
    preloaded: Arc<[i32]>,
    index: AtomicUsize,
    value: AtomicI64,
}

impl Baseline {
    /// Creates the accumulator at index zero with a zero total.
    #[must_use]
    pub fn new(preloaded: Arc<[i32]>) -> Self {
        Self {
            preloaded,
            index: AtomicUsize::new(0),
            value: AtomicI64::new(0),
        }
    }
}

impl Accumulate for Baseline {
    fn accumulate(&self) {
        let index = self.index.load(Ordering::Relaxed);

        // Another writer may have stored an index we have not wrapped yet.
        let Some(addend) = self.preloaded.get(index) else {
            self.index.store(0, Ordering::Relaxed);
            return;
        };

        let value = self.value.load(Ordering::Relaxed);
        self.value
            .store(value.wrapping_add(i64::from(*addend)), Ordering::Relaxed);

        self.index
            .store(next_index(index, self.preloaded.len()), Ordering::Relaxed);
    }

    fn read(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    fn position(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_thread_accumulates_in_order() {
        let baseline = Baseline::new(Arc::from([10, 20, 30]));

        baseline.accumulate();
        baseline.accumulate();
        assert_eq!(baseline.read(), 30);
        assert_eq!(baseline.position(), 2);

        baseline.accumulate();
        assert_eq!(baseline.read(), 60);
        assert_eq!(baseline.position(), 0);
    }

    #[test]
    fn out_of_range_index_is_reset() {
        let baseline = Baseline::new(Arc::from([1, 2]));
        baseline.index.store(7, Ordering::Relaxed);

        baseline.accumulate();

        assert_eq!(baseline.position(), 0);
        assert_eq!(baseline.read(), 0);
    }
}
