//! Reverse-geocoding response cache
//!
//! - [`CacheKey`] - coordinate rounded to a fixed precision
//! - [`AddressCache`] - bounded LRU/TTL memoization backed by moka

mod address;
mod key;

pub use address::{
    AddressCache, AddressCacheConfig, CacheEntry, CacheStats, DEFAULT_MAX_ENTRIES, DEFAULT_TTL,
};
pub use key::{CacheKey, DEFAULT_KEY_PRECISION, MAX_KEY_PRECISION};
