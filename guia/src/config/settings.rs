//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use crate::cache::{DEFAULT_KEY_PRECISION, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::geocode::{DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT, DEFAULT_ZOOM};
use crate::position::{
    AccuracyQuality, DEFAULT_MIN_DISTANCE_M, DEFAULT_MIN_QUALITY, DEFAULT_MIN_UPDATE_INTERVAL,
};
use crate::tracking::{
    DEFAULT_ENABLE_HIGH_ACCURACY, DEFAULT_LOCATION_TIMEOUT, DEFAULT_MAXIMUM_AGE,
    DEFAULT_TRACKING_INTERVAL,
};

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    /// Reverse geocoding service and cache
    pub geocoder: GeocoderSettings,
    /// Significant-change filter
    pub tracker: TrackerSettings,
    /// Periodic tracking loop
    pub tracking: TrackingSettings,
    /// Location request options
    pub location: LocationSettings,
}

/// `[geocoder]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub zoom: u8,
    /// Decimal digits kept in cache keys
    pub key_precision: u8,
    pub cache_max_entries: u64,
    /// Entry lifetime in seconds; 0 keeps entries until evicted by size
    pub cache_ttl_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT.as_secs(),
            zoom: DEFAULT_ZOOM,
            key_precision: DEFAULT_KEY_PRECISION,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

/// `[tracker]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    pub min_update_interval_ms: u64,
    pub min_distance_m: f64,
    pub min_quality: AccuracyQuality,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            min_update_interval_ms: DEFAULT_MIN_UPDATE_INTERVAL.as_millis() as u64,
            min_distance_m: DEFAULT_MIN_DISTANCE_M,
            min_quality: DEFAULT_MIN_QUALITY,
        }
    }
}

/// `[tracking]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSettings {
    pub interval_secs: u64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_TRACKING_INTERVAL.as_secs(),
        }
    }
}

/// `[location]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSettings {
    pub enable_high_accuracy: bool,
    pub maximum_age_ms: u64,
    pub timeout_secs: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            enable_high_accuracy: DEFAULT_ENABLE_HIGH_ACCURACY,
            maximum_age_ms: DEFAULT_MAXIMUM_AGE.as_millis() as u64,
            timeout_secs: DEFAULT_LOCATION_TIMEOUT.as_secs(),
        }
    }
}
