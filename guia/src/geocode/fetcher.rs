//! Cached, coalescing HTTP fetcher.
//!
//! [`CachedFetcher`] combines an [`AsyncHttpClient`], an [`AddressCache`] and
//! a [`FetchSpec`] describing how a request maps to a cache key and a URL.
//! Reverse geocoding is one such spec; the fetcher itself knows nothing about
//! coordinates.
//!
//! # Architecture
//!
//! ```text
//! fetch(A) ─┐                                     ┌─ cache hit ──► payload
//!           │                                     │
//! fetch(A) ─┼──► cache_key ──► AddressCache ──────┤
//!           │                                     │
//! fetch(A) ─┘                                     └─ miss ──► in-flight map
//!                                                              │
//!                                       first caller: HTTP GET, parse, insert
//!                                       others: wait on broadcast for result
//! ```
//!
//! The cache is only written on success. A failed fetch is broadcast to the
//! callers that were waiting on it and then forgotten, so the next call
//! retries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::error::GeocodeError;
use super::http::AsyncHttpClient;
use super::payload::RawAddressPayload;
use crate::cache::{AddressCache, AddressCacheConfig, CacheKey, CacheStats};

/// Outcome shared between the leader of a fetch and its coalesced waiters.
pub type FetchResult = Result<Arc<RawAddressPayload>, GeocodeError>;

/// Describes how a request is keyed and located.
pub trait FetchSpec: Send + Sync {
    /// Request type accepted by [`CachedFetcher::fetch`].
    type Request: ?Sized + Sync;

    /// Cache key for a request. Requests with equal keys share one response.
    fn cache_key(&self, request: &Self::Request) -> CacheKey;

    /// Absolute URL to GET for a request.
    fn url(&self, request: &Self::Request) -> String;
}

/// Counters for monitoring cache and coalescing effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Total fetch calls
    pub requests: u64,
    /// Calls answered from the cache
    pub cache_hits: u64,
    /// Calls that waited on another caller's in-flight request
    pub coalesced: u64,
    /// HTTP requests actually issued
    pub network_fetches: u64,
    /// HTTP requests that ended in an error
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    coalesced: AtomicU64,
    network_fetches: AtomicU64,
    failures: AtomicU64,
}

type InFlightMap = Mutex<HashMap<CacheKey, broadcast::Sender<FetchResult>>>;

enum Registration {
    Leader(broadcast::Sender<FetchResult>),
    Waiter(broadcast::Receiver<FetchResult>),
}

/// Removes the in-flight entry when the leader finishes or is cancelled.
struct InFlightGuard<'a> {
    map: &'a InFlightMap,
    key: CacheKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.map.lock().remove(&self.key);
    }
}

/// Memoizing HTTP fetcher with in-flight request coalescing.
pub struct CachedFetcher<C, S> {
    http: C,
    spec: S,
    cache: AddressCache,
    in_flight: InFlightMap,
    counters: Counters,
}

impl<C, S> CachedFetcher<C, S>
where
    C: AsyncHttpClient,
    S: FetchSpec,
{
    pub fn new(http: C, spec: S, cache_config: AddressCacheConfig) -> Self {
        Self {
            http,
            spec,
            cache: AddressCache::new(cache_config),
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn spec(&self) -> &S {
        &self.spec
    }

    pub fn cache(&self) -> &AddressCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
            network_fetches: self.counters.network_fetches.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Number of requests currently awaiting a response.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Returns the cached response for `request`, fetching it if needed.
    pub async fn fetch(&self, request: &S::Request) -> FetchResult {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        let key = self.spec.cache_key(request);

        if let Some(entry) = self.cache.get(&key).await {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache hit");
            return Ok(entry.value);
        }

        match self.register(&key) {
            Registration::Waiter(mut rx) => {
                self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Coalescing with in-flight request");
                rx.recv().await.unwrap_or_else(|_| {
                    Err(GeocodeError::Network(
                        "in-flight request was abandoned".to_string(),
                    ))
                })
            }
            Registration::Leader(tx) => {
                let guard = InFlightGuard {
                    map: &self.in_flight,
                    key: key.clone(),
                };

                // Another leader may have finished between the miss and registration.
                let result = match self.cache.get(&key).await {
                    Some(entry) => Ok(entry.value),
                    None => self.fetch_uncached(request, &key).await,
                };

                drop(guard);
                let waiters = tx.receiver_count();
                let _ = tx.send(result.clone());
                if waiters > 0 {
                    debug!(key = %key, waiters, "Broadcast result to coalesced waiters");
                }
                result
            }
        }
    }

    fn register(&self, key: &CacheKey) -> Registration {
        let mut in_flight = self.in_flight.lock();
        match in_flight.get(key) {
            Some(tx) => Registration::Waiter(tx.subscribe()),
            None => {
                let (tx, _rx) = broadcast::channel(1);
                in_flight.insert(key.clone(), tx.clone());
                Registration::Leader(tx)
            }
        }
    }

    async fn fetch_uncached(&self, request: &S::Request, key: &CacheKey) -> FetchResult {
        let url = self.spec.url(request);
        self.counters.network_fetches.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, url = %url, "Fetching from network");

        let outcome = match self.http.get(&url).await {
            Ok(body) => RawAddressPayload::from_slice(&body),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(payload) => {
                let payload = Arc::new(payload);
                self.cache.insert(key.clone(), Arc::clone(&payload)).await;
                Ok(payload)
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Fetch failed");
                Err(e)
            }
        }
    }
}
