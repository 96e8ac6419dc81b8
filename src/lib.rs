//! # oddsapi - The Odds API client
//!
//! A quota-aware, dry-run-first HTTP client for The Odds API
//! (`https://api.the-odds-api.com/v4`).
//!
//! ## Architecture
//!
//! - **API**: Request gateway, transport and retry policy
//! - **Credentials**: API key validation and environment checks
//! - **Config**: Layered configuration (file + environment)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use oddsapi::{ApiConfig, OddsApi, QueryParams};
//!
//! # async fn run() -> oddsapi::Result<()> {
//! // Dry-run by default: the request is logged, nothing is sent.
//! let api = OddsApi::from_env(ApiConfig::default())?;
//! let (data, quota) = api
//!     .execute("/sports", &QueryParams::new())
//!     .await?;
//! assert!(data.is_none() && quota.is_none());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;

pub use api::{OddsApi, OddsApiBuilder, QueryParams, QuotaSnapshot};
pub use config::{ApiConfig, Config};
pub use credentials::ApiKey;
pub use error::{Error, Result};
