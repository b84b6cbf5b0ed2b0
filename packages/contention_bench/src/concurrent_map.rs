use std::any::type_name;
use std::fmt;

use scc::HashMap;

use crate::SharedContainer;

/// A concurrent hash map keyed by index.
///
/// Each entry is individually consistent. Readers and writers only contend when they touch the
/// same bucket.
pub struct ConcurrentMap {
    entries: HashMap<usize, i32>,
}

impl ConcurrentMap {
    /// Creates the map with `initial[i]` stored under key `i`.
    #[must_use]
    pub fn new(initial: &[i32]) -> Self {
        let map = Self {
            entries: HashMap::with_capacity(initial.len()),
        };

        for (index, value) in initial.iter().enumerate() {
            map.set(index, *value);
        }

        map
    }
}

impl fmt::Debug for ConcurrentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl SharedContainer for ConcurrentMap {
    fn get(&self, index: usize) -> Option<i32> {
        self.entries.read(&index, |_, value| *value)
    }

    fn set(&self, index: usize, value: i32) {
        self.entries
            .entry(index)
            .and_modify(|existing| *existing = value)
            .or_insert(value);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn concurrent_puts_of_distinct_keys_all_land() {
        let map = ConcurrentMap::new(&[]);

        thread::scope(|scope| {
            for writer in 0..4_usize {
                let map = &map;
                scope.spawn(move || {
                    for offset in 0..100_usize {
                        let key = writer * 100 + offset;
                        map.set(key, i32::try_from(key).unwrap());
                    }
                });
            }
        });

        assert_eq!(map.len(), 400);
        assert_eq!(map.get(399), Some(399));
    }

    #[test]
    fn put_replaces_existing_value() {
        let map = ConcurrentMap::new(&[7]);

        map.set(0, 8);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(0), Some(8));
    }
}
