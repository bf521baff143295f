//! Guia - position tracking and address resolution
//!
//! This library turns a stream of device position readings into postal
//! addresses: readings are filtered for significant change, accepted
//! positions are reverse-geocoded through a cached HTTP client, and the
//! normalized addresses are fanned out to any number of sinks.
//!
//! # Architecture
//!
//! ```text
//! LocationSource ──► PositionTracker ──► ReverseGeocodeClient ──► AddressNormalizer
//!                         │                     │                        │
//!                         ▼                     ▼                        ▼
//!                  position subscribers    AddressCache          address subscribers
//! ```
//!
//! [`tracking::TrackingController`] drives the pipeline periodically;
//! [`app::GuiaApp`] wires it from a [`config::ConfigFile`].

pub mod address;
pub mod app;
pub mod cache;
pub mod config;
pub mod geo;
pub mod geocode;
pub mod logging;
pub mod notify;
pub mod position;
pub mod tracking;
