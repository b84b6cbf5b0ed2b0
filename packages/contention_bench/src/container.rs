//! Thread-safe containers of `i32` elements addressed by index.

use std::fmt;
use std::sync::Arc;

use crate::{ConcurrentMap, CopyOnWriteVec, GuardedMap, GuardedVec};

/// A shared container exercised element by element by reader and writer workers.
///
/// Sequences are indexed by position; maps use the index as the key. Only single-element
/// operations are consistent. Sequences of operations are not atomic as a whole.
pub trait SharedContainer: Send + Sync + fmt::Debug {
    /// Returns the element at `index`, or `None` if there is no such element.
    fn get(&self, index: usize) -> Option<i32>;

    /// Replaces the element at `index` (sequences) or inserts/replaces the entry keyed by
    /// `index` (maps).
    ///
    /// # Panics
    ///
    /// Sequences panic if `index` is out of bounds.
    fn set(&self, index: usize, value: i32);

    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns whether the container holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the wrapping sum of the elements at indexes `0..len()`.
    fn total(&self) -> i64 {
        (0..self.len()).fold(0_i64, |total, index| {
            total.wrapping_add(self.get(index).map_or(0, i64::from))
        })
    }
}

/// Whether a container is indexed by position or by key.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a container is either a sequence or a map"
)]
pub enum Shape {
    /// An array-backed sequence with `get`/`set`.
    Sequence,

    /// A hash map with `get`/`put`.
    Map,
}

/// How a container protects itself against concurrent access.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a container is either wrapped in a lock or concurrent by construction"
)]
pub enum Guard {
    /// A plain container behind one mutex.
    Wrapped,

    /// A container designed for concurrent access.
    Concurrent,
}

/// Selects which shared container a round exercises.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the compared containers are a closed set"
)]
pub enum ContainerKind {
    /// A `Vec` behind a mutex.
    #[display("Synched Vec")]
    GuardedVec,

    /// A copy-on-write sequence with lock-free reads.
    #[display("CopyOnWriteVec")]
    CopyOnWriteVec,

    /// A `HashMap` behind a mutex.
    #[display("Synched HashMap")]
    GuardedMap,

    /// A concurrent hash map.
    #[display("ConcurrentHashMap")]
    ConcurrentMap,
}

impl ContainerKind {
    /// Every container kind, in the order the container comparison reports them.
    pub const ALL: [Self; 4] = [
        Self::GuardedVec,
        Self::CopyOnWriteVec,
        Self::GuardedMap,
        Self::ConcurrentMap,
    ];

    /// Returns whether the container is a sequence or a map.
    #[must_use]
    pub fn shape(self) -> Shape {
        match self {
            Self::GuardedVec | Self::CopyOnWriteVec => Shape::Sequence,
            Self::GuardedMap | Self::ConcurrentMap => Shape::Map,
        }
    }

    /// Returns how the container is protected against concurrent access.
    #[must_use]
    pub fn guard(self) -> Guard {
        match self {
            Self::GuardedVec | Self::GuardedMap => Guard::Wrapped,
            Self::CopyOnWriteVec | Self::ConcurrentMap => Guard::Concurrent,
        }
    }

    /// Creates a fresh container holding `initial`, element `i` at index (or key) `i`.
    #[must_use]
    pub fn build(self, initial: &[i32]) -> Arc<dyn SharedContainer> {
        match self {
            Self::GuardedVec => Arc::new(GuardedVec::new(initial)),
            Self::CopyOnWriteVec => Arc::new(CopyOnWriteVec::new(initial)),
            Self::GuardedMap => Arc::new(GuardedMap::new(initial)),
            Self::ConcurrentMap => Arc::new(ConcurrentMap::new(initial)),
        }
    }
}
