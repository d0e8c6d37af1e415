//! Per-key exclusion for snapshot replacement.
//!
//! Each [`SnapshotKey`] gets its own mutex, created on first use and dropped
//! once nobody holds or waits on it. Writers for the same key queue on it;
//! writers for different keys never contend.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use arbor_core::SnapshotKey;

#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<SnapshotKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_key<T>(&self, key: &SnapshotKey, f: impl FnOnce() -> T) -> T {
        // Clone the handle out so the map shard is released before blocking.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        // The shard lock is held while counting, so no waiter can be cloning
        // the handle out concurrently.
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use arbor_core::CodebaseScope;

    #[test]
    fn same_key_is_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let key = CodebaseScope::new(1, 1, "cb").branch("main");
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (locks, key) = (locks.clone(), key.clone());
                let (inside, max_seen) = (inside.clone(), max_seen.clone());
                thread::spawn(move || {
                    locks.with_key(&key, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn different_keys_do_not_block_each_other() {
        let locks = KeyLocks::new();
        let scope = CodebaseScope::new(1, 1, "cb");
        let (a, b) = (scope.branch("a"), scope.branch("b"));

        // Nested acquisition would deadlock if the keys shared a mutex.
        let value = locks.with_key(&a, || locks.with_key(&b, || locks.len()));
        assert_eq!(value, 2);
        assert!(locks.is_empty());
    }

    #[test]
    fn entries_are_dropped_after_use() {
        let locks = KeyLocks::new();
        let scope = CodebaseScope::new(1, 1, "cb");
        for i in 0..100 {
            locks.with_key(&scope.branch(format!("b{i}")), || ());
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn waiter_keeps_the_entry_alive() {
        let locks = Arc::new(KeyLocks::new());
        let key = CodebaseScope::new(1, 1, "cb").branch("main");
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let holder = {
            let (locks, key) = (locks.clone(), key.clone());
            thread::spawn(move || {
                locks.with_key(&key, || {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        };
        entered_rx.recv().unwrap();
        let waiter = {
            let (locks, key) = (locks.clone(), key.clone());
            thread::spawn(move || locks.with_key(&key, || 7))
        };
        thread::sleep(Duration::from_millis(20));
        release_tx.send(()).unwrap();

        holder.join().unwrap();
        assert_eq!(waiter.join().unwrap(), 7);
        assert!(locks.is_empty());
    }
}
