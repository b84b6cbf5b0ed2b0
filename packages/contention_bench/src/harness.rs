//! Runs one benchmark round on a pool of pre-warmed threads and aggregates its results.

use std::iter;
use std::num::NonZero;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::threadpool::Task;
use crate::worker::WorkerTask;
use crate::{Error, PartialResult, Rendezvous, Result, Role, Target, ThreadPool};

/// The parameters of one benchmark round.
///
/// # Examples
///
/// ```
/// use contention_bench::BenchmarkConfig;
/// use new_zealand::nz;
///
/// let config = BenchmarkConfig::new("Monitor", 9, 1, nz!(10), nz!(10));
/// assert_eq!(config.workers(), 10);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BenchmarkConfig {
    test_id: String,
    readers: usize,
    writers: usize,
    container_size: NonZero<usize>,
    cycles: NonZero<u64>,
}

impl BenchmarkConfig {
    /// Creates the configuration of a round with `readers` reader and `writers` writer
    /// workers, each performing `cycles` passes over shared state of `container_size`
    /// elements.
    #[must_use]
    pub fn new(
        test_id: impl Into<String>,
        readers: usize,
        writers: usize,
        container_size: NonZero<usize>,
        cycles: NonZero<u64>,
    ) -> Self {
        Self {
            test_id: test_id.into(),
            readers,
            writers,
            container_size,
            cycles,
        }
    }

    /// Identifies the round in reports.
    #[must_use]
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    /// Number of reader workers.
    #[must_use]
    pub fn readers(&self) -> usize {
        self.readers
    }

    /// Number of writer workers.
    #[must_use]
    pub fn writers(&self) -> usize {
        self.writers
    }

    /// Number of elements in the shared state, which is also the length of one pass.
    #[must_use]
    pub fn container_size(&self) -> NonZero<usize> {
        self.container_size
    }

    /// Passes each worker performs.
    #[must_use]
    pub fn cycles(&self) -> NonZero<u64> {
        self.cycles
    }

    /// Total number of workers.
    ///
    /// # Panics
    ///
    /// Panics if the worker count overflows `usize`.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.readers
            .checked_add(self.writers)
            .expect("worker counts large enough to overflow usize cannot be scheduled")
    }
}

/// The aggregated outcome of one benchmark round.
#[derive(Clone, Debug)]
pub struct RoundResult {
    test_id: String,
    readers: usize,
    writers: usize,
    cycles: NonZero<u64>,
    duration: Duration,
    read_time: Duration,
    write_time: Duration,
    read_checksum: i64,
    final_total: i64,
}

impl RoundResult {
    /// Identifies the round in reports.
    #[must_use]
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    /// Number of reader workers that took part.
    #[must_use]
    pub fn readers(&self) -> usize {
        self.readers
    }

    /// Number of writer workers that took part.
    #[must_use]
    pub fn writers(&self) -> usize {
        self.writers
    }

    /// Passes each worker performed.
    #[must_use]
    pub fn cycles(&self) -> NonZero<u64> {
        self.cycles
    }

    /// Wall clock time from submitting the workers until the rendezvous released.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Sum of the time every reader spent on its work.
    #[must_use]
    pub fn read_time(&self) -> Duration {
        self.read_time
    }

    /// Sum of the time every writer spent on its work.
    #[must_use]
    pub fn write_time(&self) -> Duration {
        self.write_time
    }

    /// Sum of [`read_time()`][Self::read_time] and [`write_time()`][Self::write_time].
    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.read_time.saturating_add(self.write_time)
    }

    /// Wrapping sum of the checksums the readers reported.
    #[must_use]
    pub fn read_checksum(&self) -> i64 {
        self.read_checksum
    }

    /// State of the target after every worker finished.
    #[must_use]
    pub fn final_total(&self) -> i64 {
        self.final_total
    }
}

/// Where the harness is in the lifecycle of a round.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "mirrors the fixed lifecycle of a round"
)]
pub enum RoundPhase {
    /// No round is in progress.
    Idle,

    /// Workers are being created and handed to the pool.
    Submitting,

    /// Workers are executing.
    Running,

    /// The harness is waiting at the rendezvous for every worker to finish.
    #[display("awaiting barrier")]
    AwaitingBarrier,

    /// Partial results are being aggregated.
    Collecting,

    /// The round completed and its result was handed out.
    Done,
}

/// Runs benchmark rounds on a pool of pre-warmed threads.
///
/// The pool is sized once, for the largest round the harness will ever run, and reused for
/// every round and every strategy. Rounds run strictly one after another.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use contention_bench::{AccumulatorTarget, BenchmarkConfig, Harness, Strategy, seeded_values};
/// use new_zealand::nz;
///
/// let mut harness = Harness::new(nz!(2));
/// let target = Arc::new(AccumulatorTarget::new(
///     Strategy::Monitor.build(seeded_values(47, 100)),
/// ));
///
/// let config = BenchmarkConfig::new("Monitor", 1, 1, nz!(100), nz!(1000));
/// let result = harness.run_round(&config, target).unwrap();
/// println!("{}: {:?}", result.test_id(), result.duration());
/// ```
#[derive(Debug)]
pub struct Harness {
    pool: ThreadPool,
    phase: RoundPhase,
}

impl Harness {
    /// Creates a harness whose pool can run rounds of up to `max_workers` workers.
    #[must_use]
    pub fn new(max_workers: NonZero<usize>) -> Self {
        Self {
            pool: ThreadPool::new(max_workers),
            phase: RoundPhase::Idle,
        }
    }

    /// Returns the largest number of workers a round may use.
    #[must_use]
    pub fn capacity(&self) -> NonZero<usize> {
        self.pool.thread_count()
    }

    /// Returns the phase the most recent round reached. A failed round stays in the phase it
    /// failed in.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Runs one round: starts `config.readers()` readers and `config.writers()` writers against
    /// `target` and waits until all of them have arrived at the rendezvous.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolTooSmall`] if the round needs more workers than the pool has,
    /// [`Error::RendezvousBroken`] if a worker failed before arriving,
    /// [`Error::RendezvousOverrun`] if the rendezvous released before every worker arrived, and
    /// [`Error::MissingResult`] if a worker arrived without publishing its result. A failed
    /// round reports no partial results.
    pub fn run_round(
        &mut self,
        config: &BenchmarkConfig,
        target: Arc<dyn Target>,
    ) -> Result<RoundResult> {
        // The workers plus the harness itself.
        let parties = NonZero::<usize>::MIN.saturating_add(config.workers());

        self.execute_round(config, target, parties, Rendezvous::wait)
    }

    fn execute_round(
        &mut self,
        config: &BenchmarkConfig,
        target: Arc<dyn Target>,
        parties: NonZero<usize>,
        await_release: impl FnOnce(&Rendezvous) -> Result<()>,
    ) -> Result<RoundResult> {
        self.enter(RoundPhase::Idle);

        let requested = config.workers();
        let available = self.pool.thread_count().get();

        if requested > available {
            return Err(Error::PoolTooSmall {
                requested,
                available,
            });
        }

        self.enter(RoundPhase::Submitting);

        let rendezvous = Arc::new(Rendezvous::new(parties));
        let mut result_rxs = Vec::with_capacity(requested);

        let tasks = iter::repeat_n(Role::Reader, config.readers())
            .chain(iter::repeat_n(Role::Writer, config.writers()))
            .map(|role| -> Task {
                let (result_tx, result_rx) = oneshot::channel();
                result_rxs.push((role, result_rx));

                let task = WorkerTask::new(
                    role,
                    Arc::clone(&target),
                    config.cycles().get(),
                    config.container_size(),
                    result_tx,
                    rendezvous.arrival(),
                );

                Box::new(move || task.run())
            })
            .collect::<Vec<_>>();

        let start = Instant::now();

        self.pool.execute_each(tasks);
        self.enter(RoundPhase::Running);

        self.enter(RoundPhase::AwaitingBarrier);
        if let Err(error) = await_release(&rendezvous) {
            debug!(test_id = config.test_id(), %error, "round aborted");
            return Err(error);
        }

        let duration = start.elapsed();

        // Released before the workers it did not count arrived, which are still running.
        if parties.get() <= requested {
            let error = Error::RendezvousOverrun {
                parties: parties.get(),
            };
            debug!(test_id = config.test_id(), %error, "round aborted");
            return Err(error);
        }

        self.enter(RoundPhase::Collecting);

        let mut read_time = Duration::ZERO;
        let mut write_time = Duration::ZERO;
        let mut read_checksum = 0_i64;

        for (role, result_rx) in result_rxs {
            let partial: PartialResult = result_rx
                .try_recv()
                .map_err(|_not_published| Error::MissingResult { role })?;

            match partial.role {
                Role::Reader => {
                    read_time = read_time
                        .checked_add(partial.elapsed)
                        .expect("duration overflow is unfathomable within our spacetime boundaries");
                    read_checksum = read_checksum.wrapping_add(partial.checksum);
                }
                Role::Writer => {
                    write_time = write_time
                        .checked_add(partial.elapsed)
                        .expect("duration overflow is unfathomable within our spacetime boundaries");
                }
            }
        }

        let result = RoundResult {
            test_id: config.test_id().to_owned(),
            readers: config.readers(),
            writers: config.writers(),
            cycles: config.cycles(),
            duration,
            read_time,
            write_time,
            read_checksum,
            final_total: target.total(),
        };

        debug!(
            test_id = result.test_id(),
            readers = result.readers(),
            writers = result.writers(),
            cycles = result.cycles().get(),
            ?duration,
            "round completed"
        );

        self.enter(RoundPhase::Done);

        Ok(result)
    }

    fn enter(&mut self, phase: RoundPhase) {
        trace!(from = %self.phase, to = %phase, "round phase");
        self.phase = phase;
    }
}
