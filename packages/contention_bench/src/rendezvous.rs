use std::num::NonZero;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// A counting barrier: every waiter blocks until exactly `parties` waiters have arrived, then
/// all of them are released together.
///
/// Unlike [`std::sync::Barrier`], a rendezvous can break. A party that leaves without arriving
/// ([`abandon()`][Self::abandon], dropping an [`Arrival`] or a timed wait expiring) releases
/// every current and future waiter with an error instead of leaving them blocked forever.
///
/// A rendezvous releases exactly once. An arrival after the release means the party count did
/// not match the number of parties, so it fails with [`Error::RendezvousOverrun`] immediately
/// instead of blocking until some later group of parties happens to release it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use contention_bench::Rendezvous;
/// use new_zealand::nz;
///
/// let rendezvous = Arc::new(Rendezvous::new(nz!(2)));
///
/// let worker = thread::spawn({
///     let arrival = rendezvous.arrival();
///     move || arrival.arrive()
/// });
///
/// rendezvous.wait().unwrap();
/// worker.join().unwrap().unwrap();
/// ```
#[derive(Debug)]
pub struct Rendezvous {
    parties: NonZero<usize>,
    state: Mutex<State>,
    released: Condvar,
}

#[derive(Debug)]
struct State {
    arrived: usize,
    released: bool,
    broken: bool,
}

impl Rendezvous {
    /// Creates a rendezvous that releases once `parties` waiters have arrived.
    #[must_use]
    pub fn new(parties: NonZero<usize>) -> Self {
        Self {
            parties,
            state: Mutex::new(State {
                arrived: 0,
                released: false,
                broken: false,
            }),
            released: Condvar::new(),
        }
    }

    /// Returns the number of parties needed to release the rendezvous.
    #[must_use]
    pub fn parties(&self) -> NonZero<usize> {
        self.parties
    }

    /// Arrives and blocks until every party has arrived.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RendezvousBroken`] if the rendezvous is or becomes broken before it
    /// releases, or [`Error::RendezvousOverrun`] if it has already released.
    pub fn wait(&self) -> Result<()> {
        self.wait_until(None)
    }

    /// Arrives and blocks until every party has arrived or `timeout` expires.
    ///
    /// An expired wait breaks the rendezvous, releasing every other waiter with an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RendezvousTimeout`] if the wait expired,
    /// [`Error::RendezvousBroken`] if the rendezvous is or becomes broken before it releases,
    /// or [`Error::RendezvousOverrun`] if it has already released.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<()> {
        // A deadline beyond the range of `Instant` is as good as no deadline.
        let deadline = Instant::now()
            .checked_add(timeout)
            .map(|deadline| (deadline, timeout));

        self.wait_until(deadline)
    }

    /// Breaks the rendezvous, releasing every current and future waiter with an error.
    pub fn abandon(&self) {
        let mut state = self.state.lock();

        if !state.broken {
            state.broken = true;
            debug!(
                parties = self.parties.get(),
                arrived = state.arrived,
                "rendezvous abandoned"
            );
        }

        self.released.notify_all();
    }

    /// Returns whether the rendezvous has been broken.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.state.lock().broken
    }

    /// Returns whether every party has arrived and the rendezvous released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Returns a guard that arrives at the rendezvous on request and abandons it if dropped
    /// without arriving, for example while unwinding.
    pub fn arrival(self: &Arc<Self>) -> Arrival {
        Arrival {
            rendezvous: Some(Arc::clone(self)),
        }
    }

    fn wait_until(&self, deadline: Option<(Instant, Duration)>) -> Result<()> {
        let mut state = self.state.lock();

        if state.broken {
            return Err(self.broken());
        }

        if state.released {
            warn!(
                parties = self.parties.get(),
                "arrival after the rendezvous released"
            );

            return Err(Error::RendezvousOverrun {
                parties: self.parties.get(),
            });
        }

        state.arrived = state
            .arrived
            .checked_add(1)
            .expect("arrivals stop counting once the party count is reached");

        if state.arrived == self.parties.get() {
            state.released = true;

            trace!(parties = self.parties.get(), "rendezvous released");

            self.released.notify_all();
            return Ok(());
        }

        loop {
            match deadline {
                None => self.released.wait(&mut state),
                Some((deadline, timeout)) => {
                    let timed_out = self.released.wait_until(&mut state, deadline).timed_out();

                    if timed_out && !state.released && !state.broken {
                        let arrived = state.arrived;
                        state.broken = true;
                        self.released.notify_all();

                        debug!(
                            parties = self.parties.get(),
                            arrived,
                            ?timeout,
                            "rendezvous timed out"
                        );

                        return Err(Error::RendezvousTimeout {
                            parties: self.parties.get(),
                            arrived,
                            timeout,
                        });
                    }
                }
            }

            if state.released {
                return Ok(());
            }

            if state.broken {
                return Err(self.broken());
            }
        }
    }

    fn broken(&self) -> Error {
        Error::RendezvousBroken {
            parties: self.parties.get(),
        }
    }
}

/// A pending arrival at a [`Rendezvous`].
///
/// Dropping the guard without calling [`arrive()`][Self::arrive] abandons the rendezvous, so
/// a party that fails can never leave the others waiting forever.
#[derive(Debug)]
#[must_use = "dropping an arrival abandons the rendezvous"]
pub struct Arrival {
    rendezvous: Option<Arc<Rendezvous>>,
}

impl Arrival {
    /// Arrives and blocks until every party has arrived.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RendezvousBroken`] if the rendezvous is or becomes broken before it
    /// releases, or [`Error::RendezvousOverrun`] if it has already released.
    pub fn arrive(mut self) -> Result<()> {
        let rendezvous = self
            .rendezvous
            .take()
            .expect("only arrive() and drop() take the rendezvous, and both consume the guard");

        rendezvous.wait()
    }
}

impl Drop for Arrival {
    fn drop(&mut self) {
        if let Some(rendezvous) = self.rendezvous.take() {
            rendezvous.abandon();
        }
    }
}

#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use std::thread;

    use new_zealand::nz;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Rendezvous: Send, Sync);
    assert_impl_all!(Arrival: Send);

    #[test]
    fn single_party_releases_immediately() {
        let rendezvous = Rendezvous::new(nz!(1));

        rendezvous.wait().unwrap();
        assert!(rendezvous.is_released());
        assert!(!rendezvous.is_broken());
    }

    #[test]
    fn releases_when_all_parties_arrive() {
        let rendezvous = Arc::new(Rendezvous::new(nz!(4)));

        let workers = (0..3)
            .map(|_| {
                let arrival = rendezvous.arrival();
                thread::spawn(move || arrival.arrive())
            })
            .collect::<Vec<_>>();

        rendezvous.wait().unwrap();

        for worker in workers {
            worker.join().unwrap().unwrap();
        }
    }

    #[test]
    fn arrival_after_release_is_rejected_without_blocking() {
        let rendezvous = Arc::new(Rendezvous::new(nz!(2)));

        let early = thread::spawn({
            let arrival = rendezvous.arrival();
            move || arrival.arrive()
        });

        rendezvous.wait().unwrap();
        early.join().unwrap().unwrap();

        // A third party the count did not include must not wait for a release that will
        // never come again.
        let late = thread::spawn({
            let arrival = rendezvous.arrival();
            move || arrival.arrive()
        });

        assert!(matches!(
            late.join().unwrap(),
            Err(Error::RendezvousOverrun { parties: 2 })
        ));
        assert!(matches!(
            rendezvous.wait_timeout(Duration::from_secs(60)),
            Err(Error::RendezvousOverrun { parties: 2 })
        ));
        assert!(!rendezvous.is_broken());
    }

    #[test]
    fn timeout_reports_arrivals_and_breaks() {
        let rendezvous = Rendezvous::new(nz!(3));

        let error = rendezvous
            .wait_timeout(Duration::from_millis(20))
            .unwrap_err();

        assert!(matches!(
            error,
            Error::RendezvousTimeout {
                parties: 3,
                arrived: 1,
                ..
            }
        ));
        assert!(rendezvous.is_broken());
        assert!(matches!(
            rendezvous.wait(),
            Err(Error::RendezvousBroken { parties: 3 })
        ));
    }

    #[test]
    fn timeout_releases_other_waiters() {
        let rendezvous = Arc::new(Rendezvous::new(nz!(3)));

        let waiter = thread::spawn({
            let rendezvous = Arc::clone(&rendezvous);
            move || rendezvous.wait()
        });

        // Whichever of the two waits first, neither can complete without a third party.
        let timed = rendezvous.wait_timeout(Duration::from_millis(50));
        let other = waiter.join().unwrap();

        assert!(timed.is_err());
        assert!(other.is_err());
    }

    #[test]
    fn dropped_arrival_breaks_waiters() {
        let rendezvous = Arc::new(Rendezvous::new(nz!(2)));
        let arrival = rendezvous.arrival();

        let waiter = thread::spawn({
            let rendezvous = Arc::clone(&rendezvous);
            move || rendezvous.wait()
        });

        drop(arrival);

        assert!(matches!(
            waiter.join().unwrap(),
            Err(Error::RendezvousBroken { .. })
        ));
    }

    #[test]
    fn arrival_dropped_while_unwinding_breaks_rendezvous() {
        let rendezvous = Arc::new(Rendezvous::new(nz!(2)));

        let failed = thread::spawn({
            let arrival = rendezvous.arrival();
            move || {
                let _arrival = arrival;
                panic!("worker failed before arriving");
            }
        })
        .join();

        assert!(failed.is_err());
        assert!(rendezvous.wait().is_err());
    }
}
