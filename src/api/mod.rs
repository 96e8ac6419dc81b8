//! The Odds API integration.
//!
//! This module provides the request gateway for The Odds API, handling
//! credential injection, dry-run tracing, rate-limit retries and quota
//! accounting.

mod client;
mod params;
mod quota;
mod retry;
mod transport;

pub use client::{API_KEY_PARAM, ApiResponse, OddsApi, OddsApiBuilder, PreparedRequest};
pub use params::{ParamValue, QueryParams};
pub use quota::{
    HEADER_REQUESTS_LAST, HEADER_REQUESTS_REMAINING, HEADER_REQUESTS_USED, QuotaSnapshot,
};
pub use retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, RetryPolicy, Sleeper, TokioSleeper};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
