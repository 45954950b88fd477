use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use strum::IntoStaticStr;

/// Kind of record a lock key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Chart,
    Profile,
}

type LockKey = (RecordKind, u32);

/// Lock table serializing work on one record at a time.
///
/// Different keys never block each other.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `(kind, id)` is free, then hold it until the guard drops
    pub fn lock(&self, kind: RecordKind, id: u32) -> KeyGuard<'_> {
        let key = (kind, id);
        let mut held = self.held();
        while held.contains(&key) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key);
        KeyGuard { locks: self, key }
    }

    /// Whether `(kind, id)` is currently held
    pub fn is_locked(&self, kind: RecordKind, id: u32) -> bool {
        self.held().contains(&(kind, id))
    }

    fn held(&self) -> MutexGuard<'_, HashSet<LockKey>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[must_use = "the key is released as soon as the guard drops"]
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: LockKey,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.locks.held().remove(&self.key);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock(RecordKind::Chart, 1);
            assert!(locks.is_locked(RecordKind::Chart, 1));
            assert!(!locks.is_locked(RecordKind::Profile, 1));
        }
        assert!(!locks.is_locked(RecordKind::Chart, 1));
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _chart = locks.lock(RecordKind::Chart, 7);
        let _profile = locks.lock(RecordKind::Profile, 7);
        let _other = locks.lock(RecordKind::Chart, 8);
    }

    #[test]
    fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = locks.lock(RecordKind::Chart, 42);
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_kind_names() {
        let name: &'static str = RecordKind::Profile.into();
        assert_eq!(name, "profile");
    }
}
