//! Application bootstrap.
//!
//! # Architecture
//!
//! ```text
//! ConfigFile ──► AppConfig ──► GuiaApp
//!                                ├── PositionTracker
//!                                ├── ReverseGeocodeClient (owns AddressCache)
//!                                └── TrackingController ──► TrackingHandle
//! ```
//!
//! # Example
//!
//! ```ignore
//! use guia::app::{AppConfig, GuiaApp};
//! use guia::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = GuiaApp::new(config, source)?;
//! let handle = app.start_tracking();
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{build_geocoder, GuiaApp};
pub use config::AppConfig;
pub use error::AppError;
