//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let bool_str = |v: bool| if v { "true" } else { "false" };

    format!(
        r#"[geocoder]
; Nominatim-compatible reverse geocoding endpoint
base_url = {}
; User-Agent sent with every request (required by the public Nominatim service)
user_agent = {}
; Request timeout in seconds
timeout_secs = {}
; Detail level requested from the service (0-18, 18 = building)
zoom = {}
; Decimal digits kept when keying cached responses (5 = ~1.1 m)
key_precision = {}
; Maximum number of cached responses
cache_max_entries = {}
; Seconds a cached response stays valid (0 = until evicted)
cache_ttl_secs = {}

[tracker]
; Minimum time between accepted positions, in milliseconds
min_update_interval_ms = {}
; Minimum movement between accepted positions, in meters
min_distance_m = {}
; Worst accuracy band still accepted: excellent, good, medium, bad, very_bad
min_quality = {}

[tracking]
; Seconds between tracking cycles
interval_secs = {}

[location]
; Ask the location source for its most precise fix
enable_high_accuracy = {}
; Oldest previously delivered fix that may be reused, in milliseconds
maximum_age_ms = {}
; Seconds to wait for a fix
timeout_secs = {}
"#,
        config.geocoder.base_url,
        config.geocoder.user_agent,
        config.geocoder.timeout_secs,
        config.geocoder.zoom,
        config.geocoder.key_precision,
        config.geocoder.cache_max_entries,
        config.geocoder.cache_ttl_secs,
        config.tracker.min_update_interval_ms,
        config.tracker.min_distance_m,
        config.tracker.min_quality,
        config.tracking.interval_secs,
        bool_str(config.location.enable_high_accuracy),
        config.location.maximum_age_ms,
        config.location.timeout_secs,
    )
}
