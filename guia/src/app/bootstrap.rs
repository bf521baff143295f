//! Application bootstrap implementation.
//!
//! `GuiaApp` builds the tracker, geocoder and controller from one
//! [`AppConfig`] so every front end wires them the same way.

use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::geocode::{AsyncHttpClient, AsyncReqwestClient, ReverseGeocodeClient};
use crate::position::PositionTracker;
use crate::tracking::{LocationSource, TrackingController, TrackingHandle};

/// Create the production reverse geocoder for a configuration.
pub fn build_geocoder(config: &AppConfig) -> Result<ReverseGeocodeClient, AppError> {
    Ok(ReverseGeocodeClient::from_config(config.geocoder.clone())?)
}

/// Guia application: one tracker, one geocoder, one controller.
///
/// # Example
///
/// ```ignore
/// use guia::app::{AppConfig, GuiaApp};
/// use guia::tracking::PositionFeed;
///
/// let (feed, source) = PositionFeed::channel();
/// let app = GuiaApp::new(AppConfig::default(), source)?;
/// app.controller().subscribe_addresses(&display);
///
/// let handle = app.start_tracking();
/// // ... push readings into `feed` ...
/// handle.shutdown().await;
/// ```
pub struct GuiaApp<L, C = AsyncReqwestClient> {
    config: AppConfig,
    controller: TrackingController<L, C>,
}

impl<L> GuiaApp<L, AsyncReqwestClient>
where
    L: LocationSource + 'static,
{
    /// Build the application with the reqwest-backed geocoder.
    pub fn new(config: AppConfig, source: L) -> Result<Self, AppError> {
        let geocoder = build_geocoder(&config)?;
        Ok(Self::assemble(config, source, geocoder))
    }
}

impl<L, C> GuiaApp<L, C>
where
    L: LocationSource + 'static,
    C: AsyncHttpClient + 'static,
{
    /// Build the application over a custom HTTP transport.
    pub fn with_http_client(config: AppConfig, source: L, http: C) -> Result<Self, AppError> {
        let geocoder = ReverseGeocodeClient::new(http, config.geocoder.clone())?;
        Ok(Self::assemble(config, source, geocoder))
    }

    fn assemble(config: AppConfig, source: L, geocoder: ReverseGeocodeClient<C>) -> Self {
        let tracker = Arc::new(PositionTracker::new(config.tracker.clone()));
        let controller =
            TrackingController::new(source, tracker, Arc::new(geocoder), config.location);

        info!(
            base_url = %config.geocoder.base_url,
            interval_secs = config.tracking_interval.as_secs(),
            min_distance_m = config.tracker.min_distance_m,
            min_quality = %config.tracker.min_quality,
            "Guia application assembled"
        );

        Self { config, controller }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn controller(&self) -> &TrackingController<L, C> {
        &self.controller
    }

    pub fn tracker(&self) -> &Arc<PositionTracker> {
        self.controller.tracker()
    }

    pub fn geocoder(&self) -> &Arc<ReverseGeocodeClient<C>> {
        self.controller.geocoder()
    }

    /// Start periodic tracking at the configured interval.
    pub fn start_tracking(&self) -> TrackingHandle {
        self.controller.start(self.config.tracking_interval)
    }
}
