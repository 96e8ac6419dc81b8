//! Rate-limit retry policy.

use crate::config::ApiConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Default delay between retries after an HTTP 429.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default number of retries after an HTTP 429.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed-delay, bounded retry on HTTP 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first request.
    pub max_retries: u32,
    /// Delay before every retry. Does not grow.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy taken from the API configuration.
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.retry_delay(),
        }
    }

    /// Whether another retry is allowed after `retries_so_far`.
    pub fn allows_retry(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }
}

/// Waits between retries. Swapped out in tests to avoid real delays.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
