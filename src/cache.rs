//! In-memory TTL cache for aggregated results, backed by `DashMap` for
//! concurrent access.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Shortest and longest TTL the cache will accept; aggregates go stale
/// quickly while counting is in progress, so the window is deliberately
/// narrow.
const MIN_TTL_SECS: u64 = 60;
const MAX_TTL_SECS: u64 = 300;
pub const DEFAULT_TTL_SECS: u64 = 120;

/// A single cached payload with its expiration time.
struct CacheEntry {
    payload: String,
    expires_at: Instant,
}

/// Thread-safe result cache with time-to-live expiration.
///
/// Payloads are stored as serialized JSON strings. Expired entries are
/// lazily evicted on the next `get` call for that key; there is no sweeper
/// and no invalidation on publish/cancel — entries simply age out.
pub struct ResultCache {
    store: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    /// Creates a cache with the given TTL in seconds, clamped to the
    /// supported 60–300s window.
    pub fn with_ttl_secs(secs: u64) -> Self {
        Self {
            store: DashMap::new(),
            ttl: Duration::from_secs(secs.clamp(MIN_TTL_SECS, MAX_TTL_SECS)),
        }
    }

    /// Returns the cached payload for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.store.get(key)?;
        if Instant::now() > entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Inserts or overwrites an entry. Expiry is computed now, at insertion.
    pub fn set(&self, key: String, payload: String) {
        self.store.insert(
            key,
            CacheEntry {
                payload,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Unclamped constructor so tests can force immediate expiry.
    #[cfg(test)]
    pub(crate) fn with_ttl(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_TTL_SECS)
    }
}

/// Build a cache key from the election id, the resolved zone type and the
/// ordered query parameters, so semantically different queries never share
/// an entry.
pub fn cache_key(election: &str, zone_type: &str, params: &[(&str, String)]) -> String {
    let mut key = format!("{election}:{zone_type}");
    for (name, value) in params {
        key.push_str(&format!(":{name}={value}"));
    }
    key
}
