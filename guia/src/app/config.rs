//! Application configuration for GuiaApp.
//!
//! `AppConfig` combines the component configurations needed to bootstrap the
//! application and is usually built from the user's `ConfigFile`.

use std::time::Duration;

use crate::cache::AddressCacheConfig;
use crate::config::ConfigFile;
use crate::geocode::GeocoderConfig;
use crate::position::TrackerConfig;
use crate::tracking::{LocationOptions, DEFAULT_TRACKING_INTERVAL};

/// Application configuration combining all component configs.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Reverse geocoding client and cache.
    pub geocoder: GeocoderConfig,

    /// Significant-change filter thresholds.
    pub tracker: TrackerConfig,

    /// Options for each location request.
    pub location: LocationOptions,

    /// Time between tracking cycles.
    pub tracking_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geocoder: GeocoderConfig::default(),
            tracker: TrackerConfig::default(),
            location: LocationOptions::default(),
            tracking_interval: DEFAULT_TRACKING_INTERVAL,
        }
    }
}

impl AppConfig {
    /// Create application config from the configuration file.
    ///
    /// Keeps the translation from INI settings to component configs in one
    /// place rather than scattered in CLI code.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let geocoder = &config.geocoder;
        let cache = AddressCacheConfig {
            max_entries: geocoder.cache_max_entries,
            ttl: (geocoder.cache_ttl_secs > 0).then(|| Duration::from_secs(geocoder.cache_ttl_secs)),
        };

        Self {
            geocoder: GeocoderConfig::default()
                .with_base_url(geocoder.base_url.clone())
                .with_user_agent(geocoder.user_agent.clone())
                .with_timeout(Duration::from_secs(geocoder.timeout_secs))
                .with_zoom(geocoder.zoom)
                .with_key_precision(geocoder.key_precision)
                .with_cache(cache),
            tracker: TrackerConfig::default()
                .with_min_update_interval(Duration::from_millis(
                    config.tracker.min_update_interval_ms,
                ))
                .with_min_distance_m(config.tracker.min_distance_m)
                .with_min_quality(config.tracker.min_quality),
            location: LocationOptions::default()
                .with_high_accuracy(config.location.enable_high_accuracy)
                .with_maximum_age(Duration::from_millis(config.location.maximum_age_ms))
                .with_timeout(Duration::from_secs(config.location.timeout_secs)),
            tracking_interval: Duration::from_secs(config.tracking.interval_secs),
        }
    }

    /// Set the tracking interval.
    pub fn with_tracking_interval(mut self, interval: Duration) -> Self {
        self.tracking_interval = interval;
        self
    }

    /// Set the geocoder configuration.
    pub fn with_geocoder(mut self, geocoder: GeocoderConfig) -> Self {
        self.geocoder = geocoder;
        self
    }

    /// Set the tracker configuration.
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }
}
