use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::Accumulate;
use crate::strategy::Cursor;

/// Accumulator guarded by an explicitly acquired reentrant lock.
///
/// The lock guard is scoped to each operation, so the lock is released on every exit path,
/// including unwinding. The owning thread may reacquire the lock while already holding it.
#[derive(Debug)]
pub struct ExplicitLock {
    preloaded: Arc<[i32]>,
    lock: ReentrantMutex<RefCell<Cursor>>,
}

impl ExplicitLock {
    /// Creates the accumulator at index zero with a zero total.
    #[must_use]
    pub fn new(preloaded: Arc<[i32]>) -> Self {
        Self {
            preloaded,
            lock: ReentrantMutex::new(RefCell::new(Cursor::default())),
        }
    }
}

impl Accumulate for ExplicitLock {
    fn accumulate(&self) {
        let guard = self.lock.lock();
        guard.borrow_mut().advance(&self.preloaded);
    }

    fn read(&self) -> i64 {
        self.lock.lock().borrow().value
    }

    fn position(&self) -> usize {
        self.lock.lock().borrow().index
    }
}
