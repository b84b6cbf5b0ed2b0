use std::num::NonZero;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace};

/// Fixed-size pool of pre-warmed worker threads.
///
/// Benchmark rounds submit their workers to threads that already exist, so the cost of
/// creating threads is paid once per series instead of polluting every measurement.
///
/// Each submitted task gets its own thread, which is what the benchmark harness needs: every
/// worker of a round must be able to run (and block on the rendezvous) at the same time.
///
/// # Lifecycle
///
/// Dropping the pool shuts down every thread and waits for them to finish.
#[derive(Debug)]
pub struct ThreadPool {
    command_txs: Vec<mpsc::Sender<Command>>,
    join_handles: Vec<JoinHandle<()>>,
    thread_count: NonZero<usize>,
}

pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

impl ThreadPool {
    /// Creates a pool with `thread_count` threads.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create a thread.
    #[must_use]
    pub fn new(thread_count: NonZero<usize>) -> Self {
        let (command_txs, join_handles): (Vec<_>, Vec<_>) = (0..thread_count.get())
            .map(|thread_index| {
                let (tx, rx) = mpsc::channel();

                let handle = thread::Builder::new()
                    .name(format!("contention-worker-{thread_index}"))
                    .spawn(move || worker_entrypoint(&rx, thread_index))
                    .expect("failed to spawn worker thread: thread spawning failure is not supported");

                (tx, handle)
            })
            .unzip();

        debug!(thread_count = thread_count.get(), "worker pool started");

        Self {
            command_txs,
            join_handles,
            thread_count,
        }
    }

    /// Returns the number of threads in the pool.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// Submits each task to its own thread: task `i` runs on thread `i`.
    ///
    /// Returns without waiting for the tasks. Completion has to be signaled by the tasks
    /// themselves.
    ///
    /// # Panics
    ///
    /// Panics if there are more tasks than threads.
    #[cfg_attr(test, mutants::skip)] // If work does not get enqueued, deadlocks are very easy.
    #[expect(
        clippy::needless_pass_by_ref_mut,
        reason = "protects users from interleaving two rounds on the same threads"
    )]
    pub(crate) fn execute_each(&mut self, tasks: impl IntoIterator<Item = Task>) {
        // Two rounds sharing the pool would queue one round's workers behind the other's,
        // which deadlocks as soon as both wait on their rendezvous. Hence the `&mut`.
        let mut command_txs = self.command_txs.iter();

        for task in tasks {
            let tx = command_txs
                .next()
                .expect("caller must not submit more tasks than there are threads");

            tx.send(Command::Execute(task))
                .expect("worker thread must still exist - thread pool cannot operate without workers");
        }
    }
}

impl Drop for ThreadPool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        if thread::panicking() {
            // Joining workers while unwinding can block or panic again, masking the first panic.
            return;
        }

        for tx in self.command_txs.drain(..) {
            // A worker that already exited has nothing left to shut down.
            _ = tx.send(Command::Shutdown);
        }

        for handle in self.join_handles.drain(..) {
            if handle.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }

        debug!(thread_count = self.thread_count.get(), "worker pool shut down");
    }
}

enum Command {
    Execute(Task),
    Shutdown,
}

#[cfg_attr(test, mutants::skip)] // Impractical to test that things do not happen when worker function is missing.
fn worker_entrypoint(rx: &mpsc::Receiver<Command>, thread_index: usize) {
    while let Ok(Command::Execute(task)) = rx.recv() {
        trace!(thread_index, "executing task");

        // A failing task must not take the thread down with it, as the pool is reused for the
        // rest of the series. The task is responsible for reporting its own failure.
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(thread_index, "task panicked on worker thread");
        }
    }
}

#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use new_zealand::nz;

    use super::*;

    fn collect_thread_names(pool: &mut ThreadPool, task_count: usize) -> HashSet<String> {
        let (tx, rx) = mpsc::channel();

        pool.execute_each((0..task_count).map(|_| -> Task {
            let tx = tx.clone();
            Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                tx.send(name).unwrap();
            })
        }));

        (0..task_count)
            .map(|_| rx.recv().unwrap().unwrap())
            .collect()
    }

    #[test]
    fn tasks_run_on_distinct_threads() {
        let mut pool = ThreadPool::new(nz!(3));

        assert_eq!(pool.thread_count().get(), 3);

        let names = collect_thread_names(&mut pool, 3);
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|name| name.starts_with("contention-worker-")));
    }

    #[test]
    fn threads_are_reused() {
        let mut pool = ThreadPool::new(nz!(2));

        let first = collect_thread_names(&mut pool, 2);
        let second = collect_thread_names(&mut pool, 2);

        assert_eq!(first, second);
    }

    #[test]
    fn fewer_tasks_than_threads() {
        let mut pool = ThreadPool::new(nz!(4));

        assert_eq!(collect_thread_names(&mut pool, 1).len(), 1);
    }

    fn failing_task() {
        panic!("task failure");
    }

    #[test]
    fn survives_panicking_task() {
        let mut pool = ThreadPool::new(nz!(1));

        let failing: Task = Box::new(failing_task);
        pool.execute_each([failing]);

        let counter = Arc::new(Mutex::new(0));
        let (tx, rx) = mpsc::channel();

        let counting: Task = Box::new({
            let counter = Arc::clone(&counter);
            move || {
                *counter.lock().unwrap() += 1;
                tx.send(()).unwrap();
            }
        });
        pool.execute_each([counting]);

        rx.recv().unwrap();
        assert_eq!(*counter.lock().unwrap(), 1);
    }

    #[test]
    #[should_panic]
    fn rejects_more_tasks_than_threads() {
        let mut pool = ThreadPool::new(nz!(1));

        pool.execute_each((0..2).map(|_| -> Task { Box::new(|| ()) }));
    }
}
