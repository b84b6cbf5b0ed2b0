//! The shared state a round drives, and the units of work its readers and writers perform.

use std::fmt;
use std::hint::black_box;
use std::num::NonZero;
use std::sync::Arc;

use crate::{Accumulate, SharedContainer};

/// The shared state a benchmark round drives, expressed as reader and writer units of work.
///
/// The harness hands the same target to every worker of a round. How the target keeps itself
/// consistent under that sharing is entirely up to the implementation.
///
/// One cycle is a full pass of `pass_len` operations, where `pass_len` is the container size
/// of the round.
pub trait Target: Send + Sync + fmt::Debug {
    /// Performs `cycles` passes of `pass_len` read operations and returns a checksum of what
    /// was observed.
    fn read_cycles(&self, cycles: u64, pass_len: NonZero<usize>) -> i64;

    /// Performs `cycles` passes of `pass_len` write operations.
    fn write_cycles(&self, cycles: u64, pass_len: NonZero<usize>);

    /// Returns the accumulated state once the round is over.
    fn total(&self) -> i64;
}

/// Drives an accumulator: a write pass is `pass_len` calls to `accumulate()`, a read pass is
/// `pass_len` calls to `read()`.
#[derive(Debug)]
pub struct AccumulatorTarget {
    accumulator: Arc<dyn Accumulate>,
}

impl AccumulatorTarget {
    /// Wraps `accumulator` for use by the harness.
    #[must_use]
    pub fn new(accumulator: Arc<dyn Accumulate>) -> Self {
        Self { accumulator }
    }

    /// Returns the wrapped accumulator.
    #[must_use]
    pub fn accumulator(&self) -> &Arc<dyn Accumulate> {
        &self.accumulator
    }
}

impl Target for AccumulatorTarget {
    /// Returns the last total observed.
    fn read_cycles(&self, cycles: u64, pass_len: NonZero<usize>) -> i64 {
        let mut last = 0;

        for _ in 0..cycles {
            for _ in 0..pass_len.get() {
                last = black_box(self.accumulator.read());
            }
        }

        last
    }

    fn write_cycles(&self, cycles: u64, pass_len: NonZero<usize>) {
        for _ in 0..cycles {
            for _ in 0..pass_len.get() {
                self.accumulator.accumulate();
            }
        }
    }

    fn total(&self) -> i64 {
        self.accumulator.read()
    }
}

/// Drives a container: a pass visits indices `0..pass_len`. Indices past the end of the
/// container read as zero and are skipped by writers.
#[derive(Debug)]
pub struct ContainerTarget {
    container: Arc<dyn SharedContainer>,
    write_data: Arc<[i32]>,
}

impl ContainerTarget {
    /// Wraps `container`. Writers store `write_data[i]` at index `i`, so `write_data` should be
    /// at least as long as the passes of the round.
    #[must_use]
    pub fn new(container: Arc<dyn SharedContainer>, write_data: Arc<[i32]>) -> Self {
        Self {
            container,
            write_data,
        }
    }

    /// Returns the wrapped container.
    #[must_use]
    pub fn container(&self) -> &Arc<dyn SharedContainer> {
        &self.container
    }
}

impl Target for ContainerTarget {
    /// Returns the wrapping sum of every element read.
    fn read_cycles(&self, cycles: u64, pass_len: NonZero<usize>) -> i64 {
        let mut sum = 0_i64;

        for _ in 0..cycles {
            for index in 0..pass_len.get() {
                sum = sum.wrapping_add(self.container.get(index).map_or(0, i64::from));
            }
        }

        black_box(sum)
    }

    fn write_cycles(&self, cycles: u64, pass_len: NonZero<usize>) {
        for _ in 0..cycles {
            for (index, value) in self.write_data.iter().take(pass_len.get()).enumerate() {
                self.container.set(index, *value);
            }
        }
    }

    fn total(&self) -> i64 {
        self.container.total()
    }
}
