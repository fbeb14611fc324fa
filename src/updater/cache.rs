//! Transient cache tier for remote metadata.
//!
//! Keys are namespaced by a hash of the slug so that several checkers can
//! share one store. Reads take an explicit [`Refresh`] so the force-update
//! switch is decided once at startup and passed down, never looked up.

use crate::host::store::TransientStore;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};

/// Time-to-live of cached remote metadata.
pub const TRANSIENT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Whether cache reads may be served from the transient store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    /// Serve live entries from the store.
    #[default]
    UseCache,
    /// Treat every entry as missing.
    Force,
}

impl From<bool> for Refresh {
    fn from(force: bool) -> Self {
        if force {
            Self::Force
        } else {
            Self::UseCache
        }
    }
}

/// Cache key for one kind of metadata of one theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of the resolved latest version.
    #[must_use]
    pub fn new_version(slug: &str) -> Self {
        Self(format!("{}_new_version", slug_hash(slug)))
    }

    /// Key of the raw repository API snapshot.
    #[must_use]
    pub fn github_data(slug: &str) -> Self {
        Self(format!("{}_github_data", slug_hash(slug)))
    }

    /// The key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn slug_hash(slug: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(slug.as_bytes());
    hex::encode(hasher.finalize())
}

/// Read a live entry unless `refresh` forces a miss.
///
/// Store failures are logged and reported as a miss.
#[must_use]
pub fn read(store: &dyn TransientStore, key: &CacheKey, refresh: Refresh) -> Option<Value> {
    if refresh == Refresh::Force {
        debug!("Bypassing transient {}", key.as_str());
        return None;
    }

    match store.get(key.as_str()) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read transient {}: {}", key.as_str(), e);
            None
        }
    }
}

/// Write an entry for [`TRANSIENT_TTL`]. Failures are logged.
pub fn write(store: &dyn TransientStore, key: &CacheKey, value: Value) {
    if let Err(e) = store.set(key.as_str(), value, TRANSIENT_TTL) {
        warn!("Failed to write transient {}: {}", key.as_str(), e);
    }
}
