use crate::cache::error::{CacheError, CacheResult};
use crate::cache::key::{CacheKey, KeyParts};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// A cached value with its lifetime bookkeeping.
///
/// `expires_at` is always `created_at + ttl`.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: CacheKey,
    pub data: V,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    fn new(key: CacheKey, data: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            key,
            data,
            created_at: now,
            expires_at: now + ttl,
            last_accessed: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
    pub enabled: bool,
    pub evictions: u64,
    pub expirations: u64,
}

/// Bounded key → value store with lazy expiry and least-recently-used eviction
pub struct ResultCache<V> {
    entries: LruCache<String, CacheEntry<V>>,
    ttl: Duration,
    enabled: bool,
    hit_count: u64,
    miss_count: u64,
    evictions: u64,
    expirations: u64,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache holding at most `max_size` entries for `ttl` each
    pub fn new(max_size: usize, ttl: Duration) -> CacheResult<Self> {
        let capacity = NonZeroUsize::new(max_size).ok_or(CacheError::InvalidCapacity(max_size))?;
        Ok(Self {
            entries: LruCache::new(capacity),
            ttl,
            enabled: true,
            hit_count: 0,
            miss_count: 0,
            evictions: 0,
            expirations: 0,
        })
    }

    /// Look up a live entry.
    ///
    /// Expired entries are removed here rather than by a background sweep. A
    /// hit refreshes the entry's recency.
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let expired = match self.entries.get_mut(key.fingerprint()) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                self.hit_count += 1;
                return Some(entry.data.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.pop(key.fingerprint());
            self.expirations += 1;
            debug!(fingerprint = key.fingerprint(), "Cache entry expired");
        }
        self.miss_count += 1;
        None
    }

    /// Store `data` with the default TTL
    pub fn set(&mut self, key: CacheKey, data: V) {
        let ttl = self.ttl;
        self.set_with_ttl(key, data, ttl);
    }

    /// Store `data`, evicting the least recently used entry when full
    pub fn set_with_ttl(&mut self, key: CacheKey, data: V, ttl: Duration) {
        if !self.enabled {
            return;
        }

        let fingerprint = key.fingerprint().to_string();
        let entry = CacheEntry::new(key, data, ttl);
        if let Some((evicted, _)) = self.entries.push(fingerprint.clone(), entry) {
            if evicted != fingerprint {
                self.evictions += 1;
                debug!(fingerprint = %evicted, "Evicted least recently used cache entry");
            }
        }
    }

    /// Remove one entry; returns whether it was present
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        self.entries.pop(key.fingerprint()).is_some()
    }

    /// Drop every entry and reset the hit/miss counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hit_count = 0;
        self.miss_count = 0;
        self.evictions = 0;
        self.expirations = 0;
    }

    /// Remove every entry whose key components satisfy `predicate`
    pub fn invalidate_by_pattern<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&KeyParts) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry.key.parts()))
            .map(|(fingerprint, _)| fingerprint.clone())
            .collect();

        for fingerprint in &doomed {
            self.entries.pop(fingerprint);
        }
        doomed.len()
    }

    /// Enable or disable the cache; disabling drops all entries
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    /// Change capacity and TTL. Shrinking evicts least recently used entries.
    pub fn reconfigure(&mut self, max_size: usize, ttl: Duration) -> CacheResult<()> {
        let capacity = NonZeroUsize::new(max_size).ok_or(CacheError::InvalidCapacity(max_size))?;
        self.entries.resize(capacity);
        self.ttl = ttl;
        Ok(())
    }

    /// Peek at an entry without touching recency or counters
    pub fn peek_entry(&self, key: &CacheKey) -> Option<&CacheEntry<V>> {
        self.entries.peek(key.fingerprint())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hit_count + self.miss_count;
        CacheStats {
            size: self.entries.len(),
            max_size: self.entries.cap().get(),
            hit_count: self.hit_count,
            miss_count: self.miss_count,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hit_count as f64 / lookups as f64
            },
            enabled: self.enabled,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }
}
