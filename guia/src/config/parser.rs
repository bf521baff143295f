//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::cache::MAX_KEY_PRECISION;
use crate::geocode::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [geocoder] section
    if let Some(section) = ini.section(Some("geocoder")) {
        let reader = SectionReader::new("geocoder", section);
        if let Some(v) = reader.text("base_url") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("geocoder", "base_url", v, "must be an http(s) URL"));
            }
            config.geocoder.base_url = v.to_string();
        }
        if let Some(v) = reader.text("user_agent") {
            config.geocoder.user_agent = v.to_string();
        }
        if let Some(v) = reader.positive("timeout_secs", "must be a positive integer (seconds)")? {
            config.geocoder.timeout_secs = v;
        }
        if let Some(v) = reader.parse::<u8>("zoom", "must be an integer from 0 to 18")? {
            if v > MAX_ZOOM {
                return Err(invalid(
                    "geocoder",
                    "zoom",
                    &v.to_string(),
                    "must be an integer from 0 to 18",
                ));
            }
            config.geocoder.zoom = v;
        }
        if let Some(v) = reader.parse::<u8>("key_precision", "must be an integer from 0 to 10")? {
            if v > MAX_KEY_PRECISION {
                return Err(invalid(
                    "geocoder",
                    "key_precision",
                    &v.to_string(),
                    "must be an integer from 0 to 10",
                ));
            }
            config.geocoder.key_precision = v;
        }
        if let Some(v) = reader.positive("cache_max_entries", "must be a positive integer")? {
            config.geocoder.cache_max_entries = v;
        }
        if let Some(v) =
            reader.parse::<u64>("cache_ttl_secs", "must be an integer (seconds, 0 disables)")?
        {
            config.geocoder.cache_ttl_secs = v;
        }
    }

    // [tracker] section
    if let Some(section) = ini.section(Some("tracker")) {
        let reader = SectionReader::new("tracker", section);
        if let Some(v) =
            reader.parse::<u64>("min_update_interval_ms", "must be an integer (milliseconds)")?
        {
            config.tracker.min_update_interval_ms = v;
        }
        if let Some(v) =
            reader.parse::<f64>("min_distance_m", "must be a non-negative number (meters)")?
        {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(
                    "tracker",
                    "min_distance_m",
                    &v.to_string(),
                    "must be a non-negative number (meters)",
                ));
            }
            config.tracker.min_distance_m = v;
        }
        if let Some(v) = reader.text("min_quality") {
            config.tracker.min_quality = v.parse().map_err(|_| {
                invalid(
                    "tracker",
                    "min_quality",
                    v,
                    "must be one of: excellent, good, medium, bad, very_bad",
                )
            })?;
        }
    }

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        let reader = SectionReader::new("tracking", section);
        if let Some(v) = reader.positive("interval_secs", "must be a positive integer (seconds)")? {
            config.tracking.interval_secs = v;
        }
    }

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        let reader = SectionReader::new("location", section);
        if let Some(v) = reader.boolean("enable_high_accuracy")? {
            config.location.enable_high_accuracy = v;
        }
        if let Some(v) =
            reader.parse::<u64>("maximum_age_ms", "must be an integer (milliseconds)")?
        {
            config.location.maximum_age_ms = v;
        }
        if let Some(v) = reader.positive("timeout_secs", "must be a positive integer (seconds)")? {
            config.location.timeout_secs = v;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Typed access to one INI section. Empty values count as unset.
struct SectionReader<'a> {
    name: &'static str,
    properties: &'a Properties,
}

impl<'a> SectionReader<'a> {
    fn new(name: &'static str, properties: &'a Properties) -> Self {
        Self { name, properties }
    }

    fn text(&self, key: &str) -> Option<&'a str> {
        self.properties
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str, reason: &str) -> Result<Option<T>, ConfigFileError> {
        match self.text(key) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| invalid(self.name, key, v, reason)),
        }
    }

    fn positive(&self, key: &str, reason: &str) -> Result<Option<u64>, ConfigFileError> {
        match self.parse::<u64>(key, reason)? {
            Some(0) => Err(invalid(self.name, key, "0", reason)),
            other => Ok(other),
        }
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>, ConfigFileError> {
        match self.text(key) {
            None => Ok(None),
            Some(v) => match v.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Some(true)),
                "false" | "no" | "off" | "0" => Ok(Some(false)),
                _ => Err(invalid(self.name, key, v, "must be true or false")),
            },
        }
    }
}
