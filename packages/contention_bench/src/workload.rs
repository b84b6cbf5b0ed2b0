//! Deterministic data sets used to preload the shared state of a round.
//!
//! Every strategy in a comparison must see the same data, so that timing differences come from
//! synchronization overhead and not from differing workloads. All functions here are pure.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used by the benchmark programs unless configured otherwise.
pub const DEFAULT_SEED: u64 = 47;

/// Generates `len` pseudo-random values from a fixed seed.
///
/// The same seed and length always produce the same sequence.
///
/// # Examples
///
/// ```
/// use contention_bench::seeded_values;
///
/// let first = seeded_values(47, 8);
/// let second = seeded_values(47, 8);
/// assert_eq!(first, second);
/// ```
#[must_use]
pub fn seeded_values(seed: u64, len: usize) -> Arc<[i32]> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..len).map(|_| rng.random::<i32>()).collect()
}

/// Generates the counting sequence `0..len`, used to initialize containers.
///
/// # Panics
///
/// Panics if `len` exceeds the range of `i32`.
#[must_use]
pub fn counting_values(len: usize) -> Arc<[i32]> {
    (0..len)
        .map(|index| i32::try_from(index).expect("container sizes are limited to the i32 range"))
        .collect()
}

/// Returns the total a single writer reaches after `units` calls to
/// [`Accumulate::accumulate()`][crate::Accumulate::accumulate] from a fresh start.
///
/// This is the sum of `preloaded[i % len]` for every `i` in `0..units`, using the same
/// wrapping arithmetic as the accumulators.
#[must_use]
pub fn reference_total(preloaded: &[i32], units: u64) -> i64 {
    let Some(len) = u64::try_from(preloaded.len())
        .ok()
        .filter(|len| *len != 0)
    else {
        return 0;
    };

    let full_passes = units
        .checked_div(len)
        .expect("guarded by the non-zero length check above");
    let remainder = units
        .checked_rem(len)
        .expect("guarded by the non-zero length check above");
    let remainder =
        usize::try_from(remainder).expect("remainder is below the slice length, which is a usize");

    let pass_sum = wrapping_sum(preloaded);
    let prefix_sum = wrapping_sum(preloaded.get(..remainder).unwrap_or_default());

    #[expect(
        clippy::cast_possible_wrap,
        reason = "wrapping reinterpretation matches repeated wrapping addition"
    )]
    let full_passes = full_passes as i64;

    pass_sum.wrapping_mul(full_passes).wrapping_add(prefix_sum)
}

fn wrapping_sum(values: &[i32]) -> i64 {
    values
        .iter()
        .fold(0_i64, |total, value| total.wrapping_add(i64::from(*value)))
}
