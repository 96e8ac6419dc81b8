//! Request quota accounting.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Header carrying the cost of the last request.
pub const HEADER_REQUESTS_LAST: &str = "x-requests-last";
/// Header carrying the requests used this billing period.
pub const HEADER_REQUESTS_USED: &str = "x-requests-used";
/// Header carrying the requests remaining this billing period.
pub const HEADER_REQUESTS_REMAINING: &str = "x-requests-remaining";

/// Quota counters reported by the API on a successful call.
///
/// Values are kept exactly as sent. A missing or non-text header is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Cost of this request.
    pub last: Option<String>,
    /// Cumulative requests used.
    pub used: Option<String>,
    /// Requests remaining.
    pub remaining: Option<String>,
}

impl QuotaSnapshot {
    /// Read the three quota headers from a response.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            last: read(HEADER_REQUESTS_LAST),
            used: read(HEADER_REQUESTS_USED),
            remaining: read(HEADER_REQUESTS_REMAINING),
        }
    }

    /// `remaining` as a number, if present and numeric.
    pub fn remaining_count(&self) -> Option<u64> {
        parse_count(self.remaining.as_deref())
    }

    /// `used` as a number, if present and numeric.
    pub fn used_count(&self) -> Option<u64> {
        parse_count(self.used.as_deref())
    }

    /// True once the API reports no requests left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_count() == Some(0)
    }
}

// Accepts integral floats such as "10.0".
fn parse_count(value: Option<&str>) -> Option<u64> {
    let value = value?.trim();
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}
