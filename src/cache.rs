//! # Forecast Caching
//!
//! Forecast documents change slowly, so the client keeps them for a few
//! minutes instead of hitting the vendor API for every station on every
//! refresh. The cache is a capability handed to the client rather than a
//! process-wide map, which keeps it swappable and testable.
//!
//! ## Implementations
//! - [`MemoryCache`]: per-process map with per-entry expiry
//! - [`FileCache`]: one JSON file per key, survives restarts (e.g. under `/tmp`)
//! - [`NoCache`]: always misses
//!
//! Cache failures are never fatal: a corrupt or unreadable entry is a miss and a
//! failed write is logged and ignored.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs, io,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// Longest time an entry is kept, whatever the caller asks for (one year)
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// `ttl` limited to [`MAX_TTL`] so expiry stamps cannot overflow.
fn capped_ttl(key: &str, ttl: Duration) -> Duration {
    if ttl > MAX_TTL {
        warn!(key, requested_secs = ttl.as_secs(), "cache TTL too long, capping to one year");
        MAX_TTL
    } else {
        ttl
    }
}

/// Keyed store with per-entry time-to-live.
pub trait Cache<V>: Send + Sync {
    /// Fresh value for `key`, or `None` when absent or expired.
    fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key` for `ttl`.
    fn put(&self, key: &str, value: V, ttl: Duration);
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl<V> Cache<V> for NoCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn put(&self, _key: &str, _value: V, _ttl: Duration) {}
}

/// In-process cache guarded by a mutex.
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        MemoryCache {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries.
    pub fn purge(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let now = Instant::now();
            entries.retain(|_, (expires, _)| *expires > now);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().ok()?;
        let (expires, value) = entries.get(key)?;
        if Instant::now() < *expires {
            Some(value.clone())
        } else {
            None
        }
    }

    fn put(&self, key: &str, value: V, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            let expires = Instant::now() + capped_ttl(key, ttl);
            entries.insert(key.to_string(), (expires, value));
        }
    }
}

/// On-disk entry: the value plus the instant it stops being fresh.
#[derive(Serialize, Deserialize)]
struct FileEntry<V> {
    expires_at: DateTime<Utc>,
    value: V,
}

/// JSON-file cache, one file per key inside `dir`.
#[derive(Debug)]
pub struct FileCache<V> {
    dir: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> FileCache<V> {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileCache {
            dir: dir.as_ref().to_path_buf(),
            _value: PhantomData,
        }
    }

    /// File backing `key`; anything outside `[A-Za-z0-9_-]` becomes `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl<V: Serialize + DeserializeOwned> FileCache<V> {
    fn load(&self, key: &str) -> Result<V, io::Error> {
        let data = fs::read(self.path_for(key))?;
        let entry: FileEntry<V> = serde_json::from_slice(&data)?;
        if Utc::now() >= entry.expires_at {
            return Err(io::Error::other("stale"));
        }
        Ok(entry.value)
    }

    fn store(&self, key: &str, value: V, ttl: Duration) -> Result<(), io::Error> {
        let ttl = chrono::Duration::from_std(capped_ttl(key, ttl)).map_err(io::Error::other)?;
        let entry = FileEntry {
            expires_at: Utc::now() + ttl,
            value,
        };
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), serde_json::to_vec(&entry)?)?;
        Ok(())
    }
}

impl<V: Serialize + DeserializeOwned> Cache<V> for FileCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        match self.load(key) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "file cache miss");
                None
            }
        }
    }

    fn put(&self, key: &str, value: V, ttl: Duration) {
        if let Err(e) = self.store(key, value, ttl) {
            warn!(key, error = %e, "failed to write cache entry");
        }
    }
}
