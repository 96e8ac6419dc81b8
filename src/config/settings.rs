//! Configuration settings for oddsapi.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL of The Odds API (v4).
pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// Prefix for environment variable overrides (`ODDSAPI_API__DRY_RUN=false`).
pub const ENV_PREFIX: &str = "ODDSAPI";

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API configuration.
    pub api: ApiConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults.
    pub fn load_or_default() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration from file, then apply `ODDSAPI_*` environment overrides.
    ///
    /// A missing file is not an error; the defaults are used instead.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        Self::load_layered(&Self::resolve_path(path), None)
    }

    fn resolve_path(path: Option<PathBuf>) -> PathBuf {
        path.unwrap_or_else(|| {
            super::config_dir()
                .map(|p| p.join("config.toml"))
                .unwrap_or_else(|_| PathBuf::from("config.toml"))
        })
    }

    /// `env` replaces the process environment when given.
    fn load_layered(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: Self = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::configuration(e.to_string()))?;

        config.api.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = Self::resolve_path(path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| Error::configuration(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

/// API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Log requests instead of sending them.
    pub dry_run: bool,
    /// Maximum retries after an HTTP 429 before giving up.
    pub max_retries: u32,
    /// Fixed delay between 429 retries, in seconds.
    pub retry_delay_secs: u64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            dry_run: true,
            max_retries: 3,
            retry_delay_secs: 5,
            api_key_env: crate::credentials::API_KEY_ENV.to_string(),
            user_agent: format!("oddsapi/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between rate-limit retries as a `Duration`.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::configuration("base_url cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::configuration(
                "base_url must start with http:// or https://",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::configuration("timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Also write logs to a daily rolling file in the data directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "oddsapi=info".to_string(),
            file: false,
        }
    }
}
