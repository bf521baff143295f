//! User configuration stored in `~/.guia/config.ini`.
//!
//! # Example
//!
//! ```ignore
//! use guia::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("geocoding with {}", config.geocoder.base_url);
//! ```

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, default_log_path, ConfigFileError};
pub use settings::{
    ConfigFile, GeocoderSettings, LocationSettings, TrackerSettings, TrackingSettings,
};
