//! Compares guarded and concurrent containers under different reader/writer mixes.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::num::NonZero;
use std::process::ExitCode;

use argh::FromArgs;
use contention_bench::{ContainerSeries, ContainerSeriesConfig, Mix, Reporter};
use tracing::Level;

/// Runs readers and writers against guarded and concurrent sequences and maps, printing the
/// time readers and writers spent in each configuration.
#[derive(FromArgs)]
struct Args {
    /// up to three counts: repetitions of every configuration (default 10), then reader and
    /// writer threads, which replace the default mixes with a single one
    #[argh(positional)]
    counts: Vec<usize>,

    /// full passes over the container per thread (default 1000)
    #[argh(option)]
    cycles: Option<NonZero<u64>>,

    /// number of elements in each container (default 1000)
    #[argh(option)]
    container_size: Option<NonZero<usize>>,

    /// log round progress to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let [iterations, readers, writers] = match args.counts.as_slice() {
        [] => [None; 3],
        [iterations] => [Some(*iterations), None, None],
        [iterations, readers] => [Some(*iterations), Some(*readers), None],
        [iterations, readers, writers] => [Some(*iterations), Some(*readers), Some(*writers)],
        [..] => {
            eprintln!(
                "Error: expected at most 3 positional arguments (iterations, readers, writers), got {}",
                args.counts.len()
            );
            return ExitCode::FAILURE;
        }
    };

    let mut config = ContainerSeriesConfig::default();

    if let Some(iterations) = iterations {
        config.repetitions = iterations;
    }

    if readers.is_some() || writers.is_some() {
        config.mixes = vec![Mix::new(
            readers.unwrap_or_default(),
            writers.unwrap_or_default(),
        )];
    }

    if let Some(cycles) = args.cycles {
        config.cycles = cycles;
    }

    if let Some(container_size) = args.container_size {
        config.container_size = container_size;
    }

    let mut reporter = Reporter::new(io::stdout().lock());

    let outcome =
        ContainerSeries::new(config).and_then(|mut series| series.run(&mut reporter));

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
