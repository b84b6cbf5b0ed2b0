use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use crate::Accumulate;

/// Accumulator whose index and total are two independent atomics.
///
/// Each field is updated atomically, but the unit of work spans two separate atomic
/// operations plus a separate wrap-around store. A concurrent writer can advance or reset the
/// index between those steps, so with more than one writer contributions are lost or counted
/// twice. With a single writer the total is exact.
///
/// This shows that composing atomic operations does not produce an atomic composite. Use it
/// to measure overhead and to observe the race, not as a template for correct code.
#[derive(Debug)]
pub struct AtomicFields {
    preloaded: Arc<[i32]>,
    index: AtomicUsize,
    value: AtomicI64,
}

impl AtomicFields {
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

impl Accumulate for AtomicFields {
    fn accumulate(&self) {
        let len = self.preloaded.len();

        // Step one. Racing writers may push the claimed slot past the end before anyone wraps.
        let claimed = self.index.fetch_add(1, Ordering::Relaxed);
        let slot = claimed
            .checked_rem(len)
            .expect("accumulators are never built over empty data");
        let addend = self
            .preloaded
            .get(slot)
            .expect("remainder of the length is always a valid slot");

        // Step two, independent of step one.
        self.value.fetch_add(i64::from(*addend), Ordering::Relaxed);

        // Step three, also independent. May discard slots claimed by other writers meanwhile.
        if claimed.checked_add(1).is_none_or(|next| next >= len) {
            self.index.store(0, Ordering::Relaxed);
        }
    }

    fn read(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    fn position(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }
}
