//! Position acquisition model.
//!
//! # Components
//!
//! - [`reading`] - `PositionReading`, `AccuracyQuality`, `TrackedPosition`
//! - [`tracker`] - `PositionTracker` with significant-change filtering
//!
//! ```ignore
//! use guia::position::{PositionTracker, TrackerConfig, PositionReading};
//!
//! let tracker = PositionTracker::new(TrackerConfig::default());
//! match tracker.ingest(reading) {
//!     AcceptanceResult::Accepted(position) => println!("now at {}", position.coordinate),
//!     AcceptanceResult::Rejected(reason) => println!("ignored: {}", reason),
//! }
//! ```

mod reading;
mod tracker;

pub use reading::{AccuracyQuality, InvalidReading, PositionReading, TrackedPosition};
pub use tracker::{
    AcceptanceResult, PositionTracker, RejectReason, TrackerConfig, TrackerState,
    DEFAULT_MIN_DISTANCE_M, DEFAULT_MIN_QUALITY, DEFAULT_MIN_UPDATE_INTERVAL,
};
