//! Failures reported by the tracking controller.

use thiserror::Error;

use super::location::LocationError;
use crate::geocode::GeocodeError;

/// A tracking cycle failure, delivered to error subscribers.
///
/// Filtering outcomes (too soon, too close, low accuracy) are not errors and
/// never appear here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error("Invalid position reading")]
    InvalidPositionReading,

    #[error("Location permission denied")]
    LocationPermissionDenied,

    #[error("Timed out acquiring location")]
    LocationTimeout,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: status {status_code}")]
    Http { status_code: u16 },

    #[error("Failed to parse address response: {0}")]
    Parse(String),

    #[error("No address for this position: {0}")]
    NoAddress(String),
}

impl From<LocationError> for TrackingError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => Self::LocationPermissionDenied,
            LocationError::Timeout => Self::LocationTimeout,
            LocationError::Unavailable(msg) => Self::LocationUnavailable(msg),
        }
    }
}

impl From<GeocodeError> for TrackingError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::Network(msg) => Self::Network(msg),
            GeocodeError::Http { status_code } => Self::Http { status_code },
            GeocodeError::Parse(msg) => Self::Parse(msg),
            GeocodeError::NoAddress(msg) => Self::NoAddress(msg),
            GeocodeError::InvalidCoordinate(_) => Self::InvalidPositionReading,
            e @ GeocodeError::InvalidUrl { .. } => Self::Network(e.to_string()),
        }
    }
}
