use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::storage::KeyValueStorage;

/// Entries are considered expired one hour after they were written.
pub const CACHE_TTL_MS: i64 = 60 * 60 * 1000;

/// Prefix for every key the cache owns in the shared storage.
const KEY_PREFIX: &str = "cache_";

const MINUTE_MS: i64 = 60 * 1000;

/// Persisted form of a cache entry: `{ "data": T, "timestamp": <ms epoch> }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub timestamp: i64,
}

impl<T> CachedData<T> {
    pub fn new(data: T, timestamp: i64) -> Self {
        Self { data, timestamp }
    }

    pub fn age_minutes(&self, now_millis: i64) -> i64 {
        (now_millis - self.timestamp) / MINUTE_MS
    }

    pub fn age_display(&self, now_millis: i64) -> String {
        let minutes = self.age_minutes(now_millis);
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        }
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis - self.timestamp >= CACHE_TTL_MS
    }
}

/// Namespaced, expiring snapshot store shared by all resource hooks.
///
/// Every operation is fail-safe: storage or decoding problems are logged at
/// debug level and degrade to a cache miss, never to an error.
pub struct CacheStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn storage_key(name: &str) -> String {
        format!("{}{}", KEY_PREFIX, name)
    }

    /// Read the raw entry, dropping it if it has expired.
    fn load(&self, name: &str) -> Option<CachedData<serde_json::Value>> {
        let key = Self::storage_key(name);
        let contents = match self.storage.get_item(&key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        let cached: CachedData<serde_json::Value> = match serde_json::from_str(&contents) {
            Ok(cached) => cached,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to parse cache entry");
                return None;
            }
        };

        if cached.is_expired(self.clock.now_millis()) {
            debug!(cache = name, "Cache entry expired");
            if let Err(e) = self.storage.remove_item(&key) {
                debug!(cache = name, error = %e, "Failed to remove expired cache entry");
            }
            return None;
        }

        Some(cached)
    }

    /// Return the cached payload for `name` if a fresh, decodable entry exists.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let cached = self.load(name)?;
        match serde_json::from_value(cached.data) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(cache = name, error = %e, "Cached payload has unexpected shape");
                None
            }
        }
    }

    /// Replace the entry for `name` with `data`, stamped with the current time.
    pub fn set<T: Serialize>(&self, name: &str, data: &T) {
        let cached = CachedData::new(data, self.clock.now_millis());
        let contents = match serde_json::to_string(&cached) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(&Self::storage_key(name), &contents) {
            debug!(cache = name, error = %e, "Failed to write cache entry");
        }
    }

    /// Remove one entry, or every cache entry when `name` is `None`.
    /// Storage keys outside the cache namespace are left alone.
    pub fn clear(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                if let Err(e) = self.storage.remove_item(&Self::storage_key(name)) {
                    debug!(cache = name, error = %e, "Failed to clear cache entry");
                }
            }
            None => {
                let keys = match self.storage.keys() {
                    Ok(keys) => keys,
                    Err(e) => {
                        debug!(error = %e, "Failed to list cache entries");
                        return;
                    }
                };
                for key in keys.iter().filter(|k| k.starts_with(KEY_PREFIX)) {
                    if let Err(e) = self.storage.remove_item(key) {
                        debug!(key = %key, error = %e, "Failed to clear cache entry");
                    }
                }
            }
        }
    }

    /// Human readable age of the entry for `name`, if it is cached and fresh.
    pub fn entry_age(&self, name: &str) -> Option<String> {
        self.load(name)
            .map(|cached| cached.age_display(self.clock.now_millis()))
    }
}
