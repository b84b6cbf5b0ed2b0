use std::sync::Arc;

use parking_lot::Mutex;

use crate::Accumulate;
use crate::strategy::Cursor;

/// Accumulator where one mutex covers every access, like an object whose methods are all
/// declared synchronized.
#[derive(Debug)]
pub struct Monitor {
    preloaded: Arc<[i32]>,
    cursor: Mutex<Cursor>,
}

impl Monitor {
    /// Creates the accumulator at index zero with a zero total.
    #[must_use]
    pub fn new(preloaded: Arc<[i32]>) -> Self {
        Self {
            preloaded,
            cursor: Mutex::new(Cursor::default()),
        }
    }
}

impl Accumulate for Monitor {
    fn accumulate(&self) {
        self.cursor.lock().advance(&self.preloaded);
    }

    fn read(&self) -> i64 {
        self.cursor.lock().value
    }

    fn position(&self) -> usize {
        self.cursor.lock().index
    }
}

#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use std::thread;

    use super::*;
    use crate::reference_total;

    #[test]
    fn concurrent_writers_stay_exact() {
        let preloaded: Arc<[i32]> = Arc::from([3, -1, 4, 1, -5, 9, 2]);
        let monitor = Monitor::new(Arc::clone(&preloaded));

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        monitor.accumulate();
                    }
                });
            }
        });

        assert_eq!(monitor.read(), reference_total(&preloaded, 4000));
        assert!(monitor.position() < preloaded.len());
    }
}
