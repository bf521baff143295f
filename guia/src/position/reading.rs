//! Position reading types.
//!
//! - [`PositionReading`] - One fix as delivered by a location source
//! - [`AccuracyQuality`] - Categorical band derived from the accuracy radius
//! - [`TrackedPosition`] - The accepted current position held by the tracker

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{CoordError, Coordinate};

/// Categorical accuracy band derived from a reading's accuracy radius.
///
/// Variants are ordered best to worst, so `quality <= AccuracyQuality::Good`
/// reads as "good or better".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyQuality {
    /// Radius of 10 m or less.
    Excellent,
    /// Radius of 30 m or less.
    Good,
    /// Radius of 100 m or less.
    Medium,
    /// Radius of 200 m or less.
    Bad,
    /// Anything wider (or not a number).
    VeryBad,
}

impl AccuracyQuality {
    /// Classifies an accuracy radius in meters.
    pub fn from_accuracy(accuracy_m: f64) -> Self {
        if accuracy_m <= 10.0 {
            Self::Excellent
        } else if accuracy_m <= 30.0 {
            Self::Good
        } else if accuracy_m <= 100.0 {
            Self::Medium
        } else if accuracy_m <= 200.0 {
            Self::Bad
        } else {
            Self::VeryBad
        }
    }

    /// Returns true if this band is at least as good as `threshold`.
    #[inline]
    pub fn meets(&self, threshold: AccuracyQuality) -> bool {
        *self <= threshold
    }

    /// Lowercase name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Medium => "medium",
            Self::Bad => "bad",
            Self::VeryBad => "very_bad",
        }
    }
}

impl fmt::Display for AccuracyQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccuracyQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "medium" => Ok(Self::Medium),
            "bad" => Ok(Self::Bad),
            "very_bad" => Ok(Self::VeryBad),
            other => Err(format!(
                "unknown accuracy quality '{}' (expected excellent, good, medium, bad or very_bad)",
                other
            )),
        }
    }
}

/// Why a reading failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidReading {
    #[error(transparent)]
    Coordinate(#[from] CoordError),

    #[error("Invalid accuracy: {0}")]
    Accuracy(f64),

    #[error("Invalid speed: {0}")]
    Speed(f64),

    #[error("Invalid timestamp: {0}")]
    Timestamp(i64),
}

/// A single position fix from a location source.
///
/// The JSON shape mirrors the browser geolocation API, flattened:
///
/// ```json
/// {"latitude": -23.5505, "longitude": -46.6333, "accuracy": 8, "timestampMs": 1000000}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReading {
    #[serde(flatten)]
    pub coordinate: Coordinate,

    /// Altitude above the WGS84 ellipsoid in meters.
    #[serde(default)]
    pub altitude: Option<f64>,

    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,

    #[serde(default)]
    pub altitude_accuracy: Option<f64>,

    /// Direction of travel in degrees clockwise from true north.
    #[serde(default)]
    pub heading: Option<f64>,

    /// Ground speed in meters per second.
    #[serde(default)]
    pub speed: Option<f64>,

    /// Unix epoch milliseconds at which the fix was taken.
    pub timestamp_ms: i64,
}

impl PositionReading {
    /// Creates a reading with only the required fields set.
    pub fn new(coordinate: Coordinate, accuracy: f64, timestamp_ms: i64) -> Self {
        Self {
            coordinate,
            altitude: None,
            accuracy,
            altitude_accuracy: None,
            heading: None,
            speed: None,
            timestamp_ms,
        }
    }

    /// Sets the altitude fields.
    pub fn with_altitude(mut self, altitude: f64, altitude_accuracy: Option<f64>) -> Self {
        self.altitude = Some(altitude);
        self.altitude_accuracy = altitude_accuracy;
        self
    }

    /// Sets heading and speed.
    pub fn with_motion(mut self, heading: Option<f64>, speed: Option<f64>) -> Self {
        self.heading = heading;
        self.speed = speed;
        self
    }

    /// Accuracy band of this reading.
    #[inline]
    pub fn accuracy_quality(&self) -> AccuracyQuality {
        AccuracyQuality::from_accuracy(self.accuracy)
    }

    /// Checks the reading's invariants.
    pub fn validate(&self) -> Result<(), InvalidReading> {
        self.coordinate.validate()?;

        if !self.accuracy.is_finite() || self.accuracy < 0.0 {
            return Err(InvalidReading::Accuracy(self.accuracy));
        }
        if let Some(speed) = self.speed {
            if !speed.is_finite() || speed < 0.0 {
                return Err(InvalidReading::Speed(speed));
            }
        }
        if self.timestamp_ms < 0 {
            return Err(InvalidReading::Timestamp(self.timestamp_ms));
        }

        Ok(())
    }
}

/// The position currently held by the tracker.
///
/// Mirrors the accepted [`PositionReading`] and caches its accuracy band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedPosition {
    pub coordinate: Coordinate,
    pub altitude: Option<f64>,
    pub accuracy: f64,
    pub altitude_accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub timestamp_ms: i64,
    pub accuracy_quality: AccuracyQuality,
}

impl From<PositionReading> for TrackedPosition {
    fn from(reading: PositionReading) -> Self {
        let accuracy_quality = reading.accuracy_quality();
        Self {
            coordinate: reading.coordinate,
            altitude: reading.altitude,
            accuracy: reading.accuracy,
            altitude_accuracy: reading.altitude_accuracy,
            heading: reading.heading,
            speed: reading.speed,
            timestamp_ms: reading.timestamp_ms,
            accuracy_quality,
        }
    }
}
