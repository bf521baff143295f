//! Cache keys derived from rounded coordinates.

use std::fmt;

use crate::geo::Coordinate;

/// Default number of decimal digits kept in a cache key (~1.1 m at the equator).
pub const DEFAULT_KEY_PRECISION: u8 = 5;

/// Highest precision accepted for cache keys.
///
/// Beyond ~10 digits the key no longer collapses jitter from repeated polls.
pub const MAX_KEY_PRECISION: u8 = 10;

/// A `"lat,lon"` key with both components rounded to a fixed precision.
///
/// Rounding makes near-identical readings from successive polls share a cache
/// entry. Negative zero is normalized so `-0.000001` and `0.000001` produce
/// the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key from a coordinate.
    ///
    /// `precision` is clamped to [`MAX_KEY_PRECISION`].
    pub fn from_coordinate(coord: &Coordinate, precision: u8) -> Self {
        let precision = precision.min(MAX_KEY_PRECISION);
        Self(format!(
            "{},{}",
            round_component(coord.latitude, precision),
            round_component(coord.longitude, precision)
        ))
    }

    /// Wraps an already-formatted key.
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn round_component(value: f64, precision: u8) -> String {
    let scale = 10f64.powi(precision as i32);
    // Adding 0.0 turns -0.0 into +0.0
    let rounded = (value * scale).round() / scale + 0.0;
    format!("{:.*}", precision as usize, rounded)
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_key_format() {
        let key = CacheKey::from_coordinate(&coord(-23.5505, -46.6333), 5);
        assert_eq!(key.as_str(), "-23.55050,-46.63330");
    }

    #[test]
    fn test_near_identical_polls_share_key() {
        let a = CacheKey::from_coordinate(&coord(-23.550501, -46.633299), 5);
        let b = CacheKey::from_coordinate(&coord(-23.550498, -46.633302), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_positions_differ() {
        let a = CacheKey::from_coordinate(&coord(-23.55050, -46.63330), 5);
        let b = CacheKey::from_coordinate(&coord(-23.55060, -46.63330), 5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_negative_zero_normalized() {
        let a = CacheKey::from_coordinate(&coord(-0.000001, 0.000001), 5);
        let b = CacheKey::from_coordinate(&coord(0.0, 0.0), 5);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0.00000,0.00000");
    }

    #[test]
    fn test_precision_is_configurable() {
        let key = CacheKey::from_coordinate(&coord(-23.5505, -46.6333), 2);
        assert_eq!(key.as_str(), "-23.55,-46.63");
    }

    #[test]
    fn test_precision_clamped() {
        let key = CacheKey::from_coordinate(&coord(1.0, 2.0), 30);
        assert_eq!(key.as_str(), "1.0000000000,2.0000000000");
    }
}
