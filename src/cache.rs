// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Result Cache
//!
//! Bounded, TTL-aware store for search results keyed by the canonical
//! request key (see [`crate::key`]).
//!
//! # Eviction
//!
//! - **Capacity**: FIFO. When full, the oldest *inserted* entry goes. Reads
//!   never promote an entry.
//! - **TTL**: lazy. An entry older than the TTL is deleted by the `get` that
//!   finds it; there is no background sweep.
//!
//! # Flow
//!
//! ```text
//! get(key)
//!       │
//!       ├─→ Absent             → miss
//!       ├─→ age > ttl          → delete, miss (expired)
//!       └─→ age ≤ ttl          → hit, order untouched
//!
//! insert(key, value)
//!       │
//!       ├─→ key present        → replace, becomes newest
//!       └─→ at capacity        → evict oldest, then append
//! ```
//!
//! Timestamps come from `tokio::time::Instant`, so a paused Tokio clock
//! drives expiry deterministically in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::metrics;

/// Cached result entry
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order for eviction (oldest first)
    order: VecDeque<String>,
    max_entries: usize,
    ttl: Duration,
}

impl<V> Inner<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Drop oldest entries until there is room for `incoming` more.
    fn evict_for(&mut self, incoming: usize) -> usize {
        let mut evicted = 0;
        while self.entries.len() + incoming > self.max_entries {
            match self.order.pop_front() {
                Some(old_key) => {
                    self.entries.remove(&old_key);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }
}

/// Search result cache with FIFO capacity eviction and lazy TTL expiry.
pub struct ResultCache<V> {
    inner: Mutex<Inner<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    evictions: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCacheStats {
    /// Current number of entries
    pub size: usize,
    pub hits: u64,
    /// Lookups that found nothing usable (includes expired entries)
    pub misses: u64,
    /// Entries deleted because their TTL had passed when read
    pub expired: u64,
    /// Entries dropped to make room for newer ones
    pub evictions: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache holding at most `max_entries` results, each valid for `ttl`.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                max_entries,
                ttl,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a result. Expired entries are removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;

        let lookup = inner
            .entries
            .get(key)
            .map(|entry| (entry.inserted_at.elapsed() <= ttl).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                drop(inner);
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup("hit");
                Some(value)
            }
            None => {
                drop(inner);
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup("miss");
                None
            }
            Some(None) => {
                inner.remove(key);
                drop(inner);
                debug!(key, "Cache entry expired");
                self.expired.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup("expired");
                None
            }
        }
    }

    /// Cache a result. Replacing an existing key makes it the newest entry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.inner.lock();
        if inner.max_entries == 0 {
            return;
        }

        inner.remove(&key);
        let evicted = inner.evict_for(1);
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(key);
        let size = inner.entries.len();
        drop(inner);

        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            metrics::record_cache_eviction(evicted);
        }
        metrics::set_cache_entries(size);
    }

    /// Whether `key` is present, without touching TTL or counters.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Remove a single entry.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    /// Clear all cached entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        metrics::set_cache_entries(0);
    }

    /// Apply new limits. Shrinking evicts the oldest entries right away.
    pub fn reconfigure(&self, max_entries: usize, ttl: Duration) {
        let mut inner = self.inner.lock();
        inner.max_entries = max_entries;
        inner.ttl = ttl;
        let evicted = inner.evict_for(0);
        drop(inner);

        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            metrics::record_cache_eviction(evicted);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys from oldest to newest insertion.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().order.iter().cloned().collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> ResultCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        ResultCacheStats {
            size: self.len(),
            hits,
            misses,
            expired: self.expired.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}
