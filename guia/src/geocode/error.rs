//! Error types for reverse geocoding.

use thiserror::Error;

use crate::geo::CoordError;

/// Failures surfaced by [`super::ReverseGeocodeClient::resolve`].
///
/// `Clone` so one failed request can be shared with every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP error: status {status_code}")]
    Http { status_code: u16 },

    /// The body was not the expected JSON document.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The service replied with an error message instead of an address,
    /// e.g. `"Unable to geocode"` for open water.
    #[error("No address found: {0}")]
    NoAddress(String),

    /// The coordinate to resolve is outside the WGS84 ranges.
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordError),

    /// The configured service URL cannot be used.
    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl GeocodeError {
    /// Returns true for failures that may succeed if retried later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status_code } => *status_code == 429 || *status_code >= 500,
            _ => false,
        }
    }
}
