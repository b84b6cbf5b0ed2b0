//! The accumulator contract and the synchronization strategies that implement it.

use std::fmt;
use std::sync::Arc;

use crate::{AtomicFields, Baseline, ExplicitLock, Monitor};

/// Shared accumulator state whose synchronization is the subject of a measurement.
///
/// Each implementation walks a preloaded data set with an `index`, adding the value at the
/// index to a running total and wrapping the index back to zero at the end of the data.
pub trait Accumulate: Send + Sync + fmt::Debug {
    /// Performs exactly one unit of mutation: adds the value at the current index to the total
    /// and advances the index, wrapping at the end of the preloaded data.
    fn accumulate(&self);

    /// Returns the current total.
    fn read(&self) -> i64;

    /// Returns the current index into the preloaded data.
    ///
    /// Under a strategy that guarantees mutual exclusion this is always a valid slot.
    fn position(&self) -> usize;
}

/// Selects how the shared accumulator state is synchronized.
///
/// # Examples
///
/// ```
/// use contention_bench::{Strategy, seeded_values};
///
/// let accumulator = Strategy::Monitor.build(seeded_values(47, 100));
/// accumulator.accumulate();
/// println!("{}: {}", Strategy::Monitor, accumulator.read());
/// ```
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the compared strategies are a closed set"
)]
pub enum Strategy {
    /// No coordination at all. Concurrent writers lose updates.
    #[display("BaseLine")]
    Baseline,

    /// One mutex covers both the mutation and the read.
    #[display("Monitor")]
    Monitor,

    /// A reentrant lock acquired and released explicitly around each operation.
    #[display("Lock")]
    ExplicitLock,

    /// Index and total are separate atomics updated in separate steps.
    ///
    /// This is deliberately unsafe under concurrent writers: two atomic operations do not
    /// compose into one atomic operation.
    #[display("Atomic")]
    AtomicFields,
}

impl Strategy {
    /// Every strategy, in the order the lock comparison reports them.
    pub const ALL: [Self; 4] = [
        Self::Baseline,
        Self::Monitor,
        Self::ExplicitLock,
        Self::AtomicFields,
    ];

    /// Whether the strategy keeps the total exact with `writers` concurrent writers.
    #[must_use]
    pub fn is_exact_with(self, writers: usize) -> bool {
        match self {
            Self::Monitor | Self::ExplicitLock => true,
            Self::Baseline | Self::AtomicFields => writers <= 1,
        }
    }

    /// Creates fresh accumulator state over `preloaded`, synchronized by this strategy.
    ///
    /// # Panics
    ///
    /// Panics if `preloaded` is empty.
    #[must_use]
    pub fn build(self, preloaded: Arc<[i32]>) -> Arc<dyn Accumulate> {
        assert!(!preloaded.is_empty(), "accumulators need at least one preloaded value");

        match self {
            Self::Baseline => Arc::new(Baseline::new(preloaded)),
            Self::Monitor => Arc::new(Monitor::new(preloaded)),
            Self::ExplicitLock => Arc::new(ExplicitLock::new(preloaded)),
            Self::AtomicFields => Arc::new(AtomicFields::new(preloaded)),
        }
    }
}

/// Index and total of a lock-protected accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Cursor {
    pub(crate) index: usize,
    pub(crate) value: i64,
}

impl Cursor {
    /// Adds the value at the current index and advances, wrapping at the end of `preloaded`.
    pub(crate) fn advance(&mut self, preloaded: &[i32]) {
        let value = preloaded
            .get(self.index)
            .expect("index always wraps before leaving the preloaded data");

        self.value = self.value.wrapping_add(i64::from(*value));
        self.index = next_index(self.index, preloaded.len());
    }
}

/// Returns the index after `index`, wrapping to zero at `len`.
pub(crate) fn next_index(index: usize, len: usize) -> usize {
    match index.checked_add(1) {
        Some(next) if next < len => next,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{reference_total, seeded_values};

    assert_impl_all!(Strategy: Send, Sync, Copy);

    #[test]
    fn ids_match_report_labels() {
        let ids = Strategy::ALL.map(|strategy| strategy.to_string());

        assert_eq!(ids, ["BaseLine", "Monitor", "Lock", "Atomic"]);
    }

    #[test]
    fn exactness_depends_on_writer_count() {
        assert!(Strategy::Monitor.is_exact_with(5));
        assert!(Strategy::ExplicitLock.is_exact_with(5));
        assert!(Strategy::AtomicFields.is_exact_with(1));
        assert!(!Strategy::AtomicFields.is_exact_with(2));
        assert!(!Strategy::Baseline.is_exact_with(2));
    }

    #[test]
    fn every_strategy_is_exact_on_one_thread() {
        let preloaded = seeded_values(7, 13);

        for strategy in Strategy::ALL {
            let accumulator = strategy.build(Arc::clone(&preloaded));

            for _ in 0..40 {
                accumulator.accumulate();
                assert!(accumulator.position() < preloaded.len(), "{strategy}");
            }

            assert_eq!(
                accumulator.read(),
                reference_total(&preloaded, 40),
                "{strategy}"
            );
        }
    }

    #[test]
    #[should_panic]
    fn empty_data_is_rejected() {
        let _accumulator = Strategy::Monitor.build(Arc::from(Vec::new()));
    }

    #[test]
    fn cursor_wraps_at_end() {
        let preloaded = [5, 7];
        let mut cursor = Cursor::default();

        cursor.advance(&preloaded);
        assert_eq!(cursor.index, 1);

        cursor.advance(&preloaded);
        assert_eq!(cursor.index, 0);
        assert_eq!(cursor.value, 12);
    }

    #[test]
    fn next_index_wraps() {
        assert_eq!(next_index(0, 3), 1);
        assert_eq!(next_index(2, 3), 0);
        assert_eq!(next_index(usize::MAX, 3), 0);
    }
}
