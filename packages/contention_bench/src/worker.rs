use std::num::NonZero;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::Target;
use crate::rendezvous::Arrival;

/// What a worker does to the shared target during a round.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a worker either reads or writes"
)]
pub enum Role {
    /// Observes the target without modifying it.
    #[display("reader")]
    Reader,

    /// Modifies the target.
    #[display("writer")]
    Writer,
}

/// What one worker reports back to the harness when it finishes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "plain record of what one worker measured"
)]
pub struct PartialResult {
    /// The role the worker played.
    pub role: Role,

    /// Time the worker spent on its units of work.
    pub elapsed: Duration,

    /// Checksum of what a reader observed. Always zero for writers.
    pub checksum: i64,
}

/// One reader or writer of a round, bound to the round's target and rendezvous.
#[derive(derive_more::Debug)]
pub(crate) struct WorkerTask {
    role: Role,
    target: Arc<dyn Target>,
    cycles: u64,
    pass_len: NonZero<usize>,
    #[debug(ignore)]
    result_tx: oneshot::Sender<PartialResult>,
    arrival: Arrival,
}

impl WorkerTask {
    pub(crate) fn new(
        role: Role,
        target: Arc<dyn Target>,
        cycles: u64,
        pass_len: NonZero<usize>,
        result_tx: oneshot::Sender<PartialResult>,
        arrival: Arrival,
    ) -> Self {
        Self {
            role,
            target,
            cycles,
            pass_len,
            result_tx,
            arrival,
        }
    }

    /// Performs every pass of every cycle, publishes the partial result and then arrives at the rendezvous.
    ///
    /// If this unwinds before arriving, the arrival guard breaks the rendezvous.
    pub(crate) fn run(self) {
        let Self {
            role,
            target,
            cycles,
            pass_len,
            result_tx,
            arrival,
        } = self;

        let start = Instant::now();

        let checksum = match role {
            Role::Reader => target.read_cycles(cycles, pass_len),
            Role::Writer => {
                target.write_cycles(cycles, pass_len);
                0
            }
        };

        let elapsed = start.elapsed();

        trace!(%role, cycles, pass_len = pass_len.get(), ?elapsed, "worker finished");

        let result = PartialResult {
            role,
            elapsed,
            checksum,
        };

        if result_tx.send(result).is_err() {
            // The harness only gives up on a round if the rendezvous broke.
            debug!(%role, "harness no longer collecting results");
        }

        if let Err(error) = arrival.arrive() {
            debug!(%role, %error, "worker released without a clean rendezvous");
        }
    }
}
