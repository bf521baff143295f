//! Bounded in-memory cache for reverse-geocoding responses, backed by moka.
//!
//! Entries are evicted least-recently-used once `max_entries` is exceeded,
//! and optionally expire after a time-to-live. Moka's internal structures
//! are lock-free for reads, so lookups never block the Tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;

use super::key::CacheKey;
use crate::geocode::RawAddressPayload;

/// Default maximum number of cached responses.
pub const DEFAULT_MAX_ENTRIES: u64 = 1024;

/// Default time-to-live for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Configuration for [`AddressCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddressCacheConfig {
    /// Maximum number of entries retained.
    pub max_entries: u64,
    /// How long an entry stays valid. `None` keeps entries until evicted by size.
    pub ttl: Option<Duration>,
}

impl Default for AddressCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: Some(DEFAULT_TTL),
        }
    }
}

/// A cached reverse-geocoding response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: Arc<RawAddressPayload>,
    /// Unix epoch milliseconds at insertion.
    pub inserted_at_ms: i64,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub entry_count: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded key → response memoization for reverse geocoding.
pub struct AddressCache {
    cache: Cache<CacheKey, CacheEntry>,
    config: AddressCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl AddressCache {
    pub fn new(config: AddressCacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            cache: builder.build(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &AddressCacheConfig {
        &self.config
    }

    /// Looks up a cached response.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.cache.get(key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a response, replacing any previous entry for the key.
    pub async fn insert(&self, key: CacheKey, value: Arc<RawAddressPayload>) {
        let entry = CacheEntry {
            key: key.clone(),
            value,
            inserted_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        self.cache.insert(key, entry).await;
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Approximate number of entries; exact after [`Self::run_pending_tasks`].
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs moka's pending maintenance (eviction, expiration).
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            entry_count: self.cache.entry_count(),
        }
    }
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(AddressCacheConfig::default())
    }
}
