//! In-process key-value store with per-key TTL
//!
//! # Design
//!
//! - DashMap: sharded internally, reads never block other shards
//! - Lazy expiry: an expired entry is treated as absent on read and removed
//!   opportunistically; [`MemoryStore::purge_expired`] sweeps the whole map
//! - Listing collects and sorts, O(n); not for hot paths
//!
//! # Thread Safety
//!
//! All operations are thread-safe and atomic per key. Writes only lock the
//! shard holding the key.

use crate::backend::{KeyValueStore, StoreError, StoreResult};
use dashmap::DashMap;
use glob::Pattern;
use std::time::{Duration, Instant};
use tracing::trace;

/// A stored value and its expiry deadline
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Sharded in-memory store
///
/// # Example
///
/// ```
/// use planstore_storage::{KeyValueStore, MemoryStore};
/// use std::time::Duration;
///
/// let store = MemoryStore::new();
/// store.set("plan-1", "{}".to_string(), Some(Duration::from_secs(60))).unwrap();
/// assert_eq!(store.get("plan-1").unwrap().as_deref(), Some("{}"));
/// assert_eq!(store.delete("plan-1").unwrap(), 1);
/// ```
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Create with expected number of keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    /// Check if no live keys remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a live key exists
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Remaining time to live of a key
    ///
    /// `None` if the key is absent, expired, or has no expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .and_then(|deadline| deadline.checked_duration_since(now))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Remove every expired entry
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            trace!(removed, "purged expired keys");
        }
        removed
    }

    /// Remove all keys
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();

        // The read guard must be released before removing the expired entry
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
            trace!(key, "expired on read");
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        self.entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<u64> {
        let now = Instant::now();
        let removed = self
            .entries
            .remove(key)
            .map(|(_, entry)| !entry.is_expired(now))
            .unwrap_or(false);
        Ok(u64::from(removed))
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let matcher = Pattern::new(pattern)
            .map_err(|e| StoreError::unavailable("keys", pattern, e.to_string()))?;

        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .filter(|entry| matcher.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        // Sort for consistent ordering
        keys.sort();
        Ok(keys)
    }
}
