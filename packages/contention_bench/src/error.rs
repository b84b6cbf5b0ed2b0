use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::Role;

/// Errors that abort a benchmark round and, with it, the rest of the series.
///
/// Data races introduced by the deliberately unsynchronized strategies are not errors. They
/// only show up as totals that differ from the single-writer reference.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A party left the rendezvous without arriving, so the remaining parties can never be
    /// released normally. Typically a worker unwound mid-round or a timed wait expired.
    #[error("rendezvous of {parties} parties is broken: a party abandoned it before arriving")]
    RendezvousBroken {
        /// Number of parties the rendezvous was created for.
        parties: usize,
    },

    /// A timed wait on the rendezvous expired before every party arrived.
    #[error("rendezvous timed out after {timeout:?} with {arrived} of {parties} parties arrived")]
    RendezvousTimeout {
        /// Number of parties the rendezvous was created for.
        parties: usize,

        /// Number of parties that had arrived, including the one that timed out.
        arrived: usize,

        /// How long the timed out party waited.
        timeout: Duration,
    },

    /// More parties arrived than the rendezvous counts, so it released before every party
    /// of the round was done. The party count does not match the round.
    #[error("rendezvous of {parties} parties released before every party of the round arrived")]
    RendezvousOverrun {
        /// Number of parties the rendezvous was created for.
        parties: usize,
    },

    /// The round needs more workers than the pool has threads.
    #[error("round needs {requested} worker threads but the pool only has {available}")]
    PoolTooSmall {
        /// Number of workers the round asked for.
        requested: usize,

        /// Number of threads in the pool.
        available: usize,
    },

    /// A worker arrived at the rendezvous without publishing its partial result.
    #[error("a {role} worker did not publish its partial result")]
    MissingResult {
        /// Role of the worker whose result is missing.
        role: Role,
    },

    /// The benchmark configuration cannot be executed.
    #[error("invalid benchmark configuration: {problem}")]
    InvalidConfig {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// Writing the report to its output failed.
    #[error("failed to write benchmark report")]
    Report(#[from] io::Error),
}

/// A specialized `Result` type for benchmark operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
