//! Bounded on-disk cache for raw chart payloads.
//!
//! One file per key inside the cache directory. An in-memory index mirrors
//! the directory and orders keys by recency; writes evict the least recently
//! used entries once the index grows past the capacity.
//!
//! Failures after construction never propagate: a failed read is a miss and a
//! failed write returns `false`. Both rebuild the index from disk, since the
//! directory may have been changed by another process.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::cache::MIN_CAPACITY;
use crate::error::Result;

#[derive(Debug, Default)]
struct CacheIndex {
    /// key -> last-use tick
    entries: HashMap<String, u64>,
    /// last-use tick -> key, oldest first
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl CacheIndex {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn touch(&mut self, key: &str) {
        self.tick += 1;
        if let Some(previous) = self.entries.insert(key.to_string(), self.tick) {
            self.recency.remove(&previous);
        }
        self.recency.insert(self.tick, key.to_string());
    }

    /// Remove and return the least recently used key
    fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }

    /// Keys ordered from least to most recently used
    fn ordered_keys(&self) -> Vec<String> {
        self.recency.values().cloned().collect()
    }
}

#[derive(Debug)]
pub struct CacheStore {
    directory: PathBuf,
    capacity: usize,
    index: Mutex<CacheIndex>,
}

impl CacheStore {
    /// Open (creating if needed) a cache directory holding at most `capacity` entries.
    ///
    /// Failing to create the directory is the only fatal cache error.
    pub fn open<P: AsRef<Path>>(directory: P, capacity: usize) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;

        let index = scan_directory(&directory)?;
        debug!(
            "Opened chart cache at {:?} ({} entries, capacity {})",
            directory,
            index.len(),
            capacity.max(MIN_CAPACITY)
        );

        Ok(Self {
            directory,
            capacity: capacity.max(MIN_CAPACITY),
            index: Mutex::new(index),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Known keys, least recently used first
    pub fn keys(&self) -> Vec<String> {
        self.lock_index().ordered_keys()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock_index().contains(key)
    }

    /// Read a cached payload, or `None` on a miss
    pub fn read(&self, key: &str) -> Option<Vec<u8>> {
        if !is_valid_key(key) || !self.contains(key) {
            return None;
        }

        match fs::read(self.directory.join(key)) {
            Ok(bytes) => {
                self.lock_index().touch(key);
                debug!("Cache hit for {}", key);
                Some(bytes)
            }
            Err(e) => {
                warn!("Cache read of {} failed ({}), rebuilding index", key, e);
                self.refresh();
                None
            }
        }
    }

    /// Store a payload. Returns `false` if the write failed.
    pub fn write(&self, key: &str, bytes: &[u8]) -> bool {
        if !is_valid_key(key) {
            warn!("Rejected cache key {:?}", key);
            return false;
        }

        if let Err(e) = write_atomic(&self.directory, key, bytes) {
            warn!("Cache write of {} failed ({}), rebuilding index", key, e);
            if let Err(e) = fs::create_dir_all(&self.directory) {
                warn!("Could not recreate cache directory: {}", e);
            }
            self.refresh();
            return false;
        }

        let mut index = self.lock_index();
        index.touch(key);
        self.evict(&mut index);
        true
    }

    /// Rebuild the index from the directory contents
    pub fn refresh(&self) {
        match scan_directory(&self.directory) {
            Ok(index) => *self.lock_index() = index,
            Err(e) => {
                warn!("Cache directory {:?} unreadable: {}", self.directory, e);
                *self.lock_index() = CacheIndex::default();
            }
        }
    }

    fn evict(&self, index: &mut CacheIndex) {
        while index.len() > self.capacity {
            let Some(key) = index.pop_oldest() else {
                break;
            };
            match fs::remove_file(self.directory.join(&key)) {
                Ok(()) => debug!("Evicted {} from cache", key),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to evict {}: {}", key, e),
            }
        }
    }

    fn lock_index(&self) -> MutexGuard<'_, CacheIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('.') && !key.contains(['/', '\\'])
}

/// List cached files, oldest modification first
fn scan_directory(directory: &Path) -> io::Result<CacheIndex> {
    let mut files: Vec<(String, SystemTime)> = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() || !is_valid_key(&name) {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((name, modified));
    }

    files.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let mut index = CacheIndex::default();
    for (name, _) in files {
        index.touch(&name);
    }
    Ok(index)
}

fn write_atomic(directory: &Path, key: &str, bytes: &[u8]) -> io::Result<()> {
    let tmp = directory.join(format!(".{}.tmp.{}", key, std::process::id()));
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, directory.join(key)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn disk_keys(directory: &Path) -> HashSet<String> {
        fs::read_dir(directory)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect()
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path(), 10).unwrap();

        assert!(cache.write("129891", b"osu file format v14"));
        assert_eq!(cache.read("129891").as_deref(), Some(&b"osu file format v14"[..]));
        assert_eq!(cache.read("1"), None);
    }

    #[test]
    fn test_open_creates_directory_and_indexes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("charts");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("42"), b"data").unwrap();

        let cache = CacheStore::open(&path, 10).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.read("42").as_deref(), Some(&b"data"[..]));

        let fresh = dir.path().join("fresh");
        let cache = CacheStore::open(&fresh, 10).unwrap();
        assert!(fresh.is_dir());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path(), 0).unwrap();
        assert_eq!(cache.capacity(), 1);

        assert!(cache.write("1", b"a"));
        assert!(cache.write("2", b"b"));
        assert_eq!(cache.keys(), vec!["2".to_string()]);
    }

    #[test]
    fn test_overflow_leaves_exactly_capacity_entries() {
        let dir = tempfile::tempdir().unwrap();
        let capacity = 5;
        let cache = CacheStore::open(dir.path(), capacity).unwrap();

        for id in 0..=capacity {
            assert!(cache.write(&id.to_string(), b"payload"));
        }

        let on_disk = disk_keys(dir.path());
        let indexed: HashSet<String> = cache.keys().into_iter().collect();
        assert_eq!(on_disk.len(), capacity);
        assert_eq!(indexed, on_disk);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path(), 2).unwrap();

        cache.write("a", b"1");
        cache.write("b", b"2");
        // Reading "a" makes "b" the eviction candidate
        assert!(cache.read("a").is_some());
        cache.write("c", b"3");

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(!dir.path().join("b").exists());
    }

    #[test]
    fn test_out_of_band_delete_degrades_to_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path(), 10).unwrap();
        cache.write("7", b"x");
        cache.write("8", b"y");

        fs::remove_file(dir.path().join("7")).unwrap();

        assert_eq!(cache.read("7"), None);
        // Index was rebuilt from disk
        assert_eq!(cache.keys(), vec!["8".to_string()]);
    }

    #[test]
    fn test_write_recovers_from_deleted_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts");
        let cache = CacheStore::open(&path, 10).unwrap();
        cache.write("1", b"x");

        fs::remove_dir_all(&path).unwrap();

        // First write fails and recreates the directory, the next succeeds
        assert!(!cache.write("2", b"y"));
        assert!(cache.is_empty());
        assert!(cache.write("2", b"y"));
        assert_eq!(cache.read("2").as_deref(), Some(&b"y"[..]));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path(), 10).unwrap();

        assert!(!cache.write("../escape", b"x"));
        assert!(!cache.write("", b"x"));
        assert!(!cache.write(".hidden", b"x"));
        assert_eq!(cache.read("../escape"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_index_recency_stays_in_step() {
        let mut index = CacheIndex::default();
        for id in 0..100_000u32 {
            index.touch(&id.to_string());
        }
        index.touch("0");
        index.touch("1");

        assert_eq!(index.len(), 100_000);
        assert_eq!(index.recency.len(), index.entries.len());
        assert_eq!(index.pop_oldest().as_deref(), Some("2"));
        assert_eq!(index.pop_oldest().as_deref(), Some("3"));
        assert!(!index.contains("2"));

        let keys = index.ordered_keys();
        assert_eq!(keys.len(), 99_998);
        assert_eq!(keys[keys.len() - 2..], ["0".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_full_cache_evicts_one_per_write() {
        let dir = tempfile::tempdir().unwrap();
        let capacity = 1_000;
        let cache = CacheStore::open(dir.path(), capacity).unwrap();
        for id in 0..capacity {
            cache.write(&id.to_string(), b"p");
        }

        for id in capacity..capacity + 20 {
            assert!(cache.write(&id.to_string(), b"p"));
            assert_eq!(cache.len(), capacity);
            let evicted = (id - capacity).to_string();
            assert!(!cache.contains(&evicted));
            assert!(!dir.path().join(&evicted).exists());
        }
        assert_eq!(disk_keys(dir.path()).len(), capacity);
    }
}
