//! Uncontended cost of one unit of accumulator work under each synchronization strategy.
//!
//! This isolates the fixed overhead of each strategy from the contention effects that the
//! `lock_comparison` program measures.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::sync::Arc;

use contention_bench::{ContainerKind, DEFAULT_SEED, Strategy, counting_values, seeded_values};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const DATA_LEN: usize = 1_000;

fn entrypoint(c: &mut Criterion) {
    let preloaded = seeded_values(DEFAULT_SEED, DATA_LEN);

    let mut group = c.benchmark_group("accumulate");

    for strategy in Strategy::ALL {
        let accumulator = strategy.build(Arc::clone(&preloaded));

        group.bench_function(strategy.to_string(), |b| {
            b.iter(|| accumulator.accumulate());
        });
    }

    group.finish();

    let mut group = c.benchmark_group("read");

    for strategy in Strategy::ALL {
        let accumulator = strategy.build(Arc::clone(&preloaded));

        group.bench_function(strategy.to_string(), |b| {
            b.iter(|| black_box(accumulator.read()));
        });
    }

    group.finish();

    let initial = counting_values(DATA_LEN);
    let mut group = c.benchmark_group("container_set");

    for kind in ContainerKind::ALL {
        let container = kind.build(&initial);
        let mut index = 0;

        group.bench_function(kind.to_string(), |b| {
            b.iter(|| {
                container.set(index, black_box(7));
                index = (index + 1) % DATA_LEN;
            });
        });
    }

    group.finish();
}
