//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use guia::app::AppConfig;
use guia::config::{config_file_path, ConfigFile};
use tokio::runtime::Runtime;

use crate::error::CliError;

/// The config file to use: the `--config` override or `~/.guia/config.ini`.
pub fn resolve_config_path(override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

/// Load the config file (defaults when absent) and convert it for the app.
pub fn load_app_config(override_path: Option<&Path>) -> Result<AppConfig, CliError> {
    let path = resolve_config_path(override_path);
    let file = ConfigFile::load_from(&path)?;
    Ok(AppConfig::from_config_file(&file))
}

/// Build the multi-threaded runtime commands run on.
pub fn runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}
