//! Series of benchmark rounds that compare strategies against each other.
//!
//! Each series owns one [`Harness`], so its pool is created once and shared by every round
//! and every strategy. Each series starts with a warm-up round whose result is discarded.

use std::io::Write;
use std::num::NonZero;
use std::sync::Arc;

use new_zealand::nz;
use tracing::info;

use crate::{
    AccumulatorTarget, BenchmarkConfig, ContainerKind, ContainerTarget, DEFAULT_SEED, Error,
    Harness, RatioReport, Reporter, Result, RoundResult, Strategy, counting_values,
    seeded_values,
};

/// Strategy pairs compared after every lock comparison round, as `numerator / denominator`.
pub const RATIO_PAIRS: [(Strategy, Strategy); 6] = [
    (Strategy::Monitor, Strategy::Baseline),
    (Strategy::ExplicitLock, Strategy::Baseline),
    (Strategy::AtomicFields, Strategy::Baseline),
    (Strategy::Monitor, Strategy::ExplicitLock),
    (Strategy::Monitor, Strategy::AtomicFields),
    (Strategy::ExplicitLock, Strategy::AtomicFields),
];

/// Configuration of a lock comparison series.
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "configuration record built with struct update syntax"
)]
pub struct LockSeriesConfig {
    /// Number of measured rounds. The cycle count doubles after each one.
    pub iterations: usize,

    /// Passes per worker in the warm-up and the first measured round.
    pub base_cycles: NonZero<u64>,

    /// Number of preloaded values the accumulators walk through, which is also the length of
    /// one pass.
    pub container_size: NonZero<usize>,

    /// Reader workers per round.
    pub readers: usize,

    /// Writer workers per round.
    pub writers: usize,

    /// Seed of the preloaded values.
    pub seed: u64,
}

impl Default for LockSeriesConfig {
    fn default() -> Self {
        Self {
            iterations: 8,
            base_cycles: nz!(50_000),
            container_size: nz!(10),
            readers: 4,
            writers: 4,
            seed: DEFAULT_SEED,
        }
    }
}

/// The measured results of one lock comparison round.
#[derive(Clone, Debug)]
pub struct LockRound {
    cycles: NonZero<u64>,
    results: Vec<(Strategy, RoundResult)>,
    ratios: Vec<RatioReport>,
}

impl LockRound {
    /// Units of work each worker performed in this round.
    #[must_use]
    pub fn cycles(&self) -> NonZero<u64> {
        self.cycles
    }

    /// Results of every strategy, in [`Strategy::ALL`] order.
    pub fn results(&self) -> impl Iterator<Item = (Strategy, &RoundResult)> {
        self.results.iter().map(|(strategy, result)| (*strategy, result))
    }

    /// Result of one strategy.
    #[must_use]
    pub fn result(&self, strategy: Strategy) -> Option<&RoundResult> {
        self.results
            .iter()
            .find(|(candidate, _)| *candidate == strategy)
            .map(|(_, result)| result)
    }

    /// Ratios for every pair in [`RATIO_PAIRS`], in that order.
    #[must_use]
    pub fn ratios(&self) -> &[RatioReport] {
        &self.ratios
    }
}

/// Everything a lock comparison series measured.
#[derive(Clone, Debug)]
pub struct LockSeriesReport {
    warmup: RoundResult,
    rounds: Vec<LockRound>,
}

impl LockSeriesReport {
    /// The discarded warm-up round.
    #[must_use]
    pub fn warmup(&self) -> &RoundResult {
        &self.warmup
    }

    /// The measured rounds, in execution order.
    #[must_use]
    pub fn rounds(&self) -> &[LockRound] {
        &self.rounds
    }
}

/// Compares the accumulator strategies over rounds of doubling length.
#[derive(Debug)]
pub struct LockSeries {
    config: LockSeriesConfig,
    harness: Harness,
    preloaded: Arc<[i32]>,
}

impl LockSeries {
    /// Prepares the series, generating the preloaded values and starting the pool.
    #[must_use]
    pub fn new(config: LockSeriesConfig) -> Self {
        let workers = config.readers.saturating_add(config.writers);
        let preloaded = seeded_values(config.seed, config.container_size.get());

        Self {
            harness: Harness::new(NonZero::new(workers).unwrap_or(nz!(1))),
            preloaded,
            config,
        }
    }

    /// Runs the warm-up round and every measured round, writing each as it completes.
    ///
    /// # Errors
    ///
    /// Any harness or output error aborts the remaining rounds. Rounds already written stay
    /// written. Doubling the cycle count past `u64::MAX` is [`Error::InvalidConfig`].
    pub fn run<W: Write>(&mut self, reporter: &mut Reporter<W>) -> Result<LockSeriesReport> {
        info!(
            iterations = self.config.iterations,
            readers = self.config.readers,
            writers = self.config.writers,
            "starting lock comparison"
        );

        // The first round pays for cold caches and lazily initialized threads.
        reporter.line("Warmup")?;
        let warmup = self.round(Strategy::Baseline, self.config.base_cycles)?;
        reporter.timing(&warmup)?;

        let mut rounds = Vec::with_capacity(self.config.iterations);
        let mut cycles = self.config.base_cycles;

        for iteration in 0..self.config.iterations {
            if iteration != 0 {
                cycles = cycles.checked_mul(nz!(2)).ok_or_else(|| Error::InvalidConfig {
                    problem: format!("doubling {cycles} cycles overflows"),
                })?;
            }

            reporter.round_header(cycles.get())?;

            let mut results = Vec::with_capacity(Strategy::ALL.len());

            for strategy in Strategy::ALL {
                let result = self.round(strategy, cycles)?;
                reporter.timing(&result)?;
                results.push((strategy, result));
            }

            let mut round = LockRound {
                cycles,
                results,
                ratios: Vec::with_capacity(RATIO_PAIRS.len()),
            };

            let ratios = RATIO_PAIRS
                .iter()
                .map(|(numerator, denominator)| {
                    let numerator = round
                        .result(*numerator)
                        .expect("every strategy ran in this round");
                    let denominator = round
                        .result(*denominator)
                        .expect("every strategy ran in this round");

                    RatioReport::new(numerator, denominator)
                })
                .collect::<Vec<_>>();

            for ratio in &ratios {
                reporter.ratio(ratio)?;
            }

            round.ratios = ratios;
            rounds.push(round);
        }

        Ok(LockSeriesReport { warmup, rounds })
    }

    fn round(&mut self, strategy: Strategy, cycles: NonZero<u64>) -> Result<RoundResult> {
        let config = BenchmarkConfig::new(
            strategy.to_string(),
            self.config.readers,
            self.config.writers,
            self.config.container_size,
            cycles,
        );

        // Fresh shared state for every round, over the same preloaded values.
        let target = Arc::new(AccumulatorTarget::new(
            strategy.build(Arc::clone(&self.preloaded)),
        ));

        self.harness.run_round(&config, target)
    }
}

/// A number of readers and writers running concurrently.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "a mix is fully described by its two counts"
)]
pub struct Mix {
    /// Reader workers.
    pub readers: usize,

    /// Writer workers.
    pub writers: usize,
}

impl Mix {
    /// Creates a mix of `readers` readers and `writers` writers.
    #[must_use]
    pub const fn new(readers: usize, writers: usize) -> Self {
        Self { readers, writers }
    }

    /// Total number of workers.
    #[must_use]
    pub fn workers(self) -> usize {
        self.readers.saturating_add(self.writers)
    }
}

/// The mixes the container comparison runs unless configured otherwise.
pub const DEFAULT_MIXES: [Mix; 3] = [Mix::new(10, 0), Mix::new(9, 1), Mix::new(5, 5)];

/// Configuration of a container comparison series.
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "configuration record built with struct update syntax"
)]
pub struct ContainerSeriesConfig {
    /// Measured rounds per container kind and mix.
    pub repetitions: usize,

    /// Full passes over the container per worker.
    pub cycles: NonZero<u64>,

    /// Number of elements in each container.
    pub container_size: NonZero<usize>,

    /// Reader/writer mixes to run, in order.
    pub mixes: Vec<Mix>,

    /// Container kinds to compare, in order.
    pub kinds: Vec<ContainerKind>,

    /// Seed of the values writers store.
    pub seed: u64,
}

impl Default for ContainerSeriesConfig {
    fn default() -> Self {
        Self {
            repetitions: 10,
            cycles: nz!(1000),
            container_size: nz!(1000),
            mixes: DEFAULT_MIXES.to_vec(),
            kinds: ContainerKind::ALL.to_vec(),
            seed: DEFAULT_SEED,
        }
    }
}

/// Compares guarded and concurrent containers under each configured reader/writer mix.
#[derive(Debug)]
pub struct ContainerSeries {
    config: ContainerSeriesConfig,
    harness: Harness,
    initial: Arc<[i32]>,
    write_data: Arc<[i32]>,
}

impl ContainerSeries {
    /// Prepares the series, sizing the pool for the largest mix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the container size exceeds the `i32` range of
    /// the element values.
    pub fn new(config: ContainerSeriesConfig) -> Result<Self> {
        let size = config.container_size.get();

        if i32::try_from(size).is_err() {
            return Err(Error::InvalidConfig {
                problem: format!("container size {size} exceeds the i32 element range"),
            });
        }

        let max_workers = config.mixes.iter().map(|mix| mix.workers()).max();

        Ok(Self {
            harness: Harness::new(max_workers.and_then(NonZero::new).unwrap_or(nz!(1))),
            initial: counting_values(size),
            write_data: seeded_values(config.seed, size),
            config,
        })
    }

    /// Runs a discarded warm-up round, then every repetition of every mix for every kind,
    /// writing each round as it completes.
    ///
    /// # Errors
    ///
    /// Any harness or output error aborts the remaining rounds. Rounds already written stay
    /// written.
    pub fn run<W: Write>(&mut self, reporter: &mut Reporter<W>) -> Result<Vec<RoundResult>> {
        info!(
            repetitions = self.config.repetitions,
            kinds = self.config.kinds.len(),
            mixes = self.config.mixes.len(),
            "starting container comparison"
        );

        let first_kind = self.config.kinds.first().copied();
        let first_mix = self.config.mixes.first().copied();

        // Discarded, only pays for cold caches and lazily initialized threads.
        if let (Some(kind), Some(mix)) = (first_kind, first_mix) {
            _ = self.round(kind, mix)?;
        }

        reporter.container_header()?;

        let capacity = self
            .config
            .kinds
            .len()
            .saturating_mul(self.config.mixes.len())
            .saturating_mul(self.config.repetitions);
        let mut results = Vec::with_capacity(capacity);

        for kind in self.config.kinds.clone() {
            for mix in self.config.mixes.clone() {
                for _ in 0..self.config.repetitions {
                    let result = self.round(kind, mix)?;
                    reporter.container_timing(&result)?;
                    results.push(result);
                }
            }
        }

        Ok(results)
    }

    fn round(&mut self, kind: ContainerKind, mix: Mix) -> Result<RoundResult> {
        let config = BenchmarkConfig::new(
            format!("{kind} {}r {}w", mix.readers, mix.writers),
            mix.readers,
            mix.writers,
            self.config.container_size,
            self.config.cycles,
        );

        let target = Arc::new(ContainerTarget::new(
            kind.build(&self.initial),
            Arc::clone(&self.write_data),
        ));

        self.harness.run_round(&config, target)
    }
}

#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use super::*;

    fn small_lock_config(iterations: usize) -> LockSeriesConfig {
        LockSeriesConfig {
            iterations,
            base_cycles: nz!(100),
            container_size: nz!(64),
            readers: 2,
            writers: 1,
            seed: 1,
        }
    }

    #[test]
    fn lock_series_doubles_cycles() {
        let mut series = LockSeries::new(small_lock_config(4));
        let mut reporter = Reporter::new(Vec::new());

        let report = series.run(&mut reporter).unwrap();

        let cycles = report
            .rounds()
            .iter()
            .map(|round| round.cycles().get())
            .collect::<Vec<_>>();
        assert_eq!(cycles, [100, 200, 400, 800]);
        assert_eq!(report.warmup().test_id(), "BaseLine");
    }

    #[test]
    fn lock_series_ratios_follow_pairs() {
        let mut series = LockSeries::new(small_lock_config(1));
        let mut reporter = Reporter::new(Vec::new());

        let report = series.run(&mut reporter).unwrap();
        let round = report.rounds().first().unwrap();

        let labels = round
            .ratios()
            .iter()
            .map(|ratio| format!("{}/{}", ratio.numerator_id(), ratio.denominator_id()))
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                "Monitor/BaseLine",
                "Lock/BaseLine",
                "Atomic/BaseLine",
                "Monitor/Lock",
                "Monitor/Atomic",
                "Lock/Atomic"
            ]
        );
        assert_eq!(round.results().count(), 4);
    }

    #[test]
    fn lock_series_single_writer_totals_are_exact() {
        let config = small_lock_config(2);
        let preloaded = seeded_values(config.seed, config.container_size.get());
        let mut series = LockSeries::new(config);
        let mut reporter = Reporter::new(Vec::new());

        let report = series.run(&mut reporter).unwrap();

        let pass_sum = preloaded.iter().map(|value| i64::from(*value)).sum::<i64>();

        for round in report.rounds() {
            let cycles = round.cycles().get();

            for (strategy, result) in round.results() {
                assert_eq!(
                    result.final_total(),
                    i64::try_from(cycles).unwrap() * pass_sum,
                    "{strategy}"
                );
            }
        }
    }

    #[test]
    fn lock_series_overflowing_cycles_is_invalid() {
        // No workers, so the huge rounds before the overflow complete instantly.
        let mut series = LockSeries::new(LockSeriesConfig {
            base_cycles: NonZero::new(u64::MAX / 2 + 1).unwrap(),
            readers: 0,
            writers: 0,
            ..small_lock_config(2)
        });
        let mut reporter = Reporter::new(Vec::new());

        let error = series.run(&mut reporter).unwrap_err();
        assert!(matches!(error, Error::InvalidConfig { .. }));

        // The first round was written before the failure.
        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(output.matches("Cycles").count(), 1);
    }

    #[test]
    fn container_series_reports_every_repetition() {
        let mut series = ContainerSeries::new(ContainerSeriesConfig {
            repetitions: 2,
            cycles: nz!(3),
            container_size: nz!(16),
            mixes: vec![Mix::new(2, 0), Mix::new(1, 1)],
            kinds: ContainerKind::ALL.to_vec(),
            seed: 9,
        })
        .unwrap();
        let mut reporter = Reporter::new(Vec::new());

        let results = series.run(&mut reporter).unwrap();

        assert_eq!(results.len(), 4 * 2 * 2);
        assert_eq!(results.first().unwrap().test_id(), "Synched Vec 2r 0w");
        assert_eq!(results.last().unwrap().test_id(), "ConcurrentHashMap 1r 1w");

        let output = String::from_utf8(reporter.into_inner()).unwrap();

        // Only rounds with both readers and writers get a sum line.
        assert_eq!(output.matches("readTime + writeTime =").count(), 4 * 2);
        assert!(output.starts_with("Type"));
    }

    #[test]
    fn container_series_writer_leaves_write_data() {
        let mut series = ContainerSeries::new(ContainerSeriesConfig {
            repetitions: 1,
            cycles: nz!(2),
            container_size: nz!(8),
            mixes: vec![Mix::new(0, 1)],
            kinds: vec![ContainerKind::ConcurrentMap],
            seed: 3,
        })
        .unwrap();

        let results = series.run(&mut Reporter::new(Vec::new())).unwrap();
        let expected = seeded_values(3, 8)
            .iter()
            .fold(0_i64, |total, value| total.wrapping_add(i64::from(*value)));

        assert_eq!(results.first().unwrap().final_total(), expected);
    }

    #[test]
    fn container_size_beyond_i32_is_rejected() {
        let size = usize::try_from(i32::MAX).unwrap() + 1;

        let error = ContainerSeries::new(ContainerSeriesConfig {
            container_size: NonZero::new(size).unwrap(),
            ..ContainerSeriesConfig::default()
        })
        .unwrap_err();

        assert!(matches!(error, Error::InvalidConfig { .. }));
    }
}
