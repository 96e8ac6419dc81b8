//! Configuration management for oddsapi.

mod settings;

pub use settings::{ApiConfig, Config, LoggingConfig, DEFAULT_BASE_URL, ENV_PREFIX};

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "oddsapi", "oddsapi")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::configuration("Could not determine config directory"))
}

/// Get the log directory path.
pub fn log_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "oddsapi", "oddsapi")
        .map(|dirs| dirs.data_dir().join("logs"))
        .ok_or_else(|| Error::configuration("Could not determine log directory"))
}
