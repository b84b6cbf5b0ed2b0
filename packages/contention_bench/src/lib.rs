//! Measures the cost of synchronization under reader/writer contention.
//!
//! This package runs the same workload against shared state guarded in different ways and
//! reports how long each variant took, both absolutely and relative to each other:
//!
//! - [`Strategy`] - ways to protect a running total that walks through preloaded values: no
//!   synchronization at all, a monitor-style mutex, an explicit reentrant lock and independent
//!   atomic fields
//! - [`ContainerKind`] - guarded and concurrent sequences and maps, exercised element by element
//!
//! Results are only comparable within one execution. Absolute numbers depend entirely on the
//! hardware and on whatever else the machine is doing.
//!
//! # Operating Principles
//!
//! ## Rounds
//!
//! A [`Harness`] owns a [`ThreadPool`] whose threads are created once and reused for every
//! round. A round submits its readers and writers to the pool, starts the clock and waits on a
//! [`Rendezvous`] of `readers + writers + 1` parties. The extra party is the harness itself,
//! so the clock stops only after every worker has finished and published its
//! [`PartialResult`].
//!
//! If a worker fails before arriving, the rendezvous breaks and the round fails with
//! [`Error::RendezvousBroken`] instead of hanging forever. A rendezvous releases only once, so
//! a round whose party count misses a worker fails with [`Error::RendezvousOverrun`] and the
//! late worker returns to the pool instead of waiting for a release that never comes.
//!
//! Every worker performs `cycles` passes, each of `container_size` operations.
//!
//! ## Series
//!
//! [`LockSeries`] compares every [`Strategy`] over rounds whose cycle count doubles each time,
//! printing [`RATIO_PAIRS`] after every round. [`ContainerSeries`] compares every
//! [`ContainerKind`] under a set of reader/writer [`Mix`]es. Both start with a warm-up round
//! whose result is discarded.
//!
//! ## Correctness
//!
//! Only [`Strategy::Monitor`] and [`Strategy::ExplicitLock`] keep an exact total under any
//! number of concurrent writers. The others are exact with a single writer and may lose
//! updates otherwise, which is the point of comparing them. See [`Strategy::is_exact_with()`].
//!
//! # Example
//!
//! ```
//! use contention_bench::{LockSeries, LockSeriesConfig, Reporter};
//! use new_zealand::nz;
//!
//! let mut series = LockSeries::new(LockSeriesConfig {
//!     iterations: 2,
//!     base_cycles: nz!(1000),
//!     container_size: nz!(10),
//!     ..LockSeriesConfig::default()
//! });
//!
//! let mut reporter = Reporter::new(Vec::new());
//! let report = series.run(&mut reporter).unwrap();
//!
//! for round in report.rounds() {
//!     for ratio in round.ratios() {
//!         println!("{ratio}");
//!     }
//! }
//! ```

mod atomic_fields;
mod baseline;
mod concurrent_map;
mod container;
mod copy_on_write;
mod error;
mod explicit_lock;
mod guarded;
mod harness;
mod monitor;
mod rendezvous;
mod report;
mod series;
mod strategy;
mod target;
mod threadpool;
mod worker;
mod workload;

pub use atomic_fields::*;
pub use baseline::*;
pub use concurrent_map::*;
pub use container::*;
pub use copy_on_write::*;
pub use error::*;
pub use explicit_lock::*;
pub use guarded::*;
pub use harness::*;
pub use monitor::*;
pub use rendezvous::*;
pub use report::*;
pub use series::*;
pub use strategy::*;
pub use target::*;
pub use threadpool::*;
pub use worker::*;
pub use workload::*;
