//! Application error types.

use std::fmt;

use crate::config::ConfigFileError;
use crate::geocode::GeocodeError;

/// Errors that can occur while bootstrapping the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to load or save the configuration file.
    ConfigFile(ConfigFileError),

    /// Failed to create the reverse geocoding client.
    GeocoderCreation(GeocodeError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ConfigFile(e) => {
                write!(f, "Configuration file error: {}", e)
            }
            AppError::GeocoderCreation(e) => {
                write!(f, "Failed to create geocoder: {}", e)
            }
            AppError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::ConfigFile(e) => Some(e),
            AppError::GeocoderCreation(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::ConfigFile(e)
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        AppError::GeocoderCreation(e)
    }
}
