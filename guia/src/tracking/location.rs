//! Location source abstraction.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::position::PositionReading;

/// Default: ask for the most precise fix available.
pub const DEFAULT_ENABLE_HIGH_ACCURACY: bool = true;

/// Default: never reuse a previously delivered fix.
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::ZERO;

/// Default time allowed for a fix to arrive.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    /// Prefer GPS-grade fixes over faster, coarser ones.
    pub enable_high_accuracy: bool,
    /// Oldest cached fix that may be returned instead of waiting for a new one.
    pub maximum_age: Duration,
    /// How long to wait for a fix before giving up.
    pub timeout: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: DEFAULT_ENABLE_HIGH_ACCURACY,
            maximum_age: DEFAULT_MAXIMUM_AGE,
            timeout: DEFAULT_LOCATION_TIMEOUT,
        }
    }
}

impl LocationOptions {
    pub fn with_high_accuracy(mut self, enabled: bool) -> Self {
        self.enable_high_accuracy = enabled;
        self
    }

    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.maximum_age = maximum_age;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Why a position could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Timed out waiting for a position")]
    Timeout,

    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Something that can produce the device's current position.
pub trait LocationSource: Send + Sync {
    /// Requests the current position.
    fn current_position(
        &self,
        options: &LocationOptions,
    ) -> impl Future<Output = Result<PositionReading, LocationError>> + Send;
}

impl<T: LocationSource> LocationSource for std::sync::Arc<T> {
    fn current_position(
        &self,
        options: &LocationOptions,
    ) -> impl Future<Output = Result<PositionReading, LocationError>> + Send {
        (**self).current_position(options)
    }
}
