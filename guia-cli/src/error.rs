//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use guia::app::AppError;
use guia::config::ConfigFileError;
use guia::geocode::GeocodeError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to load or save the configuration file
    ConfigFile(ConfigFileError),
    /// Failed to assemble the application
    App(AppError),
    /// A command-line value was rejected
    InvalidArgument(String),
    /// Reverse geocoding failed
    Geocode(GeocodeError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to install the Ctrl-C handler
    Signal(String),
    /// Failed to read position input
    Input(std::io::Error),
    /// Failed to render output as JSON
    Render(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Geocode(GeocodeError::Http { status_code: 403 })
            | CliError::Geocode(GeocodeError::Http { status_code: 429 }) => {
                eprintln!();
                eprintln!("The geocoding service refused the request. Check that:");
                eprintln!("  1. user_agent in [geocoder] identifies your application");
                eprintln!("  2. You stay within the service's usage policy (1 request/s)");
            }
            CliError::Geocode(GeocodeError::Network(_)) => {
                eprintln!();
                eprintln!("Check your network connection and the [geocoder] base_url setting.");
            }
            CliError::Geocode(e) if e.is_transient() => {
                eprintln!();
                eprintln!("The geocoding service is temporarily unavailable; try again shortly.");
            }
            CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Run 'guia config show' to see the settings in effect.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Geocode(e) => write!(f, "Failed to resolve address: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Signal(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Input(e) => write!(f, "Failed to read positions: {}", e),
            CliError::Render(e) => write!(f, "Failed to render output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Geocode(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Input(e) => Some(e),
            CliError::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<GeocodeError> for CliError {
    fn from(e: GeocodeError) -> Self {
        CliError::Geocode(e)
    }
}
