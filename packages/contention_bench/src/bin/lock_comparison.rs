//! Compares the overhead of unsynchronized, locked and atomic accumulators.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::num::NonZero;
use std::process::ExitCode;

use argh::FromArgs;
use contention_bench::{LockSeries, LockSeriesConfig, Reporter};
use tracing::Level;

/// Runs 4 readers and 4 writers against every accumulator strategy, doubling the cycle count
/// after each round, and prints how the strategies compare.
#[derive(FromArgs)]
struct Args {
    /// number of measured rounds (default 8)
    #[argh(positional)]
    iterations: Option<usize>,

    /// number of preloaded values, one pass over them per cycle (default 10)
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

    let mut config = LockSeriesConfig::default();

    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }

    if let Some(container_size) = args.container_size {
        config.container_size = container_size;
    }

    let mut reporter = Reporter::new(io::stdout().lock());

    match LockSeries::new(config).run(&mut reporter) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
