//! Periodic tracking: location sources and the controller that drives them.
//!
//! # Components
//!
//! - [`LocationSource`] - where readings come from
//! - [`PositionFeed`] / [`FeedLocationSource`] - push-fed source
//! - [`TrackingController`] - acquire → filter → resolve → notify loop
//! - [`TrackingHandle`] - stops the loop when stopped or dropped

mod controller;
mod error;
mod feed;
mod location;

pub use controller::{
    AddressEvent, CycleOutcome, TrackingController, TrackingHandle, DEFAULT_TRACKING_INTERVAL,
    MIN_TRACKING_INTERVAL,
};
pub use error::TrackingError;
pub use feed::{FeedLocationSource, PositionFeed};
pub use location::{
    LocationError, LocationOptions, LocationSource, DEFAULT_ENABLE_HIGH_ACCURACY,
    DEFAULT_LOCATION_TIMEOUT, DEFAULT_MAXIMUM_AGE,
};
