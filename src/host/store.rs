//! Key-value transient stores with per-entry time-to-live.
//!
//! A transient is a cached JSON value that silently disappears once its TTL
//! elapses. Two stores are provided: an in-memory one for long-running hosts
//! and tests, and a JSON file store so that one-shot processes (the CLI)
//! share a cache across runs.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A key-value store with explicit TTL support.
pub trait TransientStore: Send + Sync {
    /// Get an unexpired value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;
}

/// Store statistics for monitoring.
#[derive(Debug, Default, Clone)]
pub struct StoreStats {
    /// Number of reads that found a live entry.
    pub hits: u64,
    /// Number of reads that found nothing (or an expired entry).
    pub misses: u64,
    /// Number of writes.
    pub writes: u64,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    expires_at: Instant,
}

/// In-memory transient store.
#[derive(Clone, Default)]
pub struct MemoryTransientStore {
    inner: Arc<Mutex<HashMap<String, MemoryEntry>>>,
    stats: Arc<Mutex<StoreStats>>,
}

impl MemoryTransientStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current statistics.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.stats.lock().clone()
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl TransientStore for MemoryTransientStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.inner.lock();
        let live = entries
            .get(key)
            .map(|entry| (entry.expires_at > Instant::now(), entry.value.clone()));
        let found = match live {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        Ok(found)
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.inner.lock().insert(key.to_string(), entry);
        self.stats.lock().writes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    value: Value,
    expires_at: DateTime<Utc>,
}

/// Transient store persisted as a single JSON file.
///
/// Writes replace the file atomically. Expired entries are dropped on the
/// next write, and a file that fails to parse is treated as empty.
pub struct FileTransientStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTransientStore {
    /// File name used inside the cache directory.
    pub const FILE_NAME: &'static str = "transients.json";

    /// Open (or lazily create) a store at `<dir>/transients.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(Self::FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, FileEntry>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(
                    "Discarding corrupt transient file {}: {}",
                    self.path.display(),
                    e
                );
                HashMap::new()
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &HashMap<String, FileEntry>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Store(format!("no parent for {}", self.path.display())))?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.persist(&self.path)
            .map_err(|e| Error::Store(format!("failed to persist {}: {e}", self.path.display())))?;
        Ok(())
    }
}

impl TransientStore for FileTransientStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock();
        let entries = self.load()?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let _guard = self.lock.lock();
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::Store(format!("TTL out of range: {e}")))?;

        let mut entries = self.load()?;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            FileEntry {
                value,
                expires_at: now + ttl,
            },
        );

        debug!("Writing transient {} to {}", key, self.path.display());
        self.save(&entries)
    }
}
