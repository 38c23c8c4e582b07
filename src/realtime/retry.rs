// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Reconnect backoff for the realtime link.
//!
//! # Example
//!
//! ```
//! use search_session::realtime::RetryConfig;
//! use std::time::Duration;
//!
//! // Live views: keep trying until the link is dropped
//! let live = RetryConfig::persistent();
//! assert_eq!(live.max_retries, None);
//!
//! // Optional push updates: give up quickly
//! let bounded = RetryConfig::bounded();
//! assert_eq!(bounded.max_retries, Some(5));
//! assert_eq!(bounded.delay_for(1), Duration::from_millis(400));
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

/// Backoff between connection attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// `None` retries forever
    pub max_retries: Option<usize>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::persistent()
    }
}

impl RetryConfig {
    /// Never give up; backoff capped at one minute.
    #[must_use]
    pub fn persistent() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            factor: 2.0,
        }
    }

    /// Five attempts, giving up after about three seconds of backoff.
    #[must_use]
    pub fn bounded() -> Self {
        Self {
            max_retries: Some(5),
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(3),
            factor: 2.0,
        }
    }

    /// Minimal delays for tests
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_retries: Some(3),
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
        }
    }

    /// Delay to wait after the `attempt`-th consecutive failure (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 0..attempt {
            if delay >= self.max_delay {
                break;
            }
            delay = delay.mul_f64(self.factor).min(self.max_delay);
        }
        delay.min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or `config.max_retries` attempts failed.
pub async fn retry<F, Fut, T, E>(operation_name: &str, config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts: usize = 0;

    loop {
        match operation().await {
            Ok(val) => {
                if attempts > 0 {
                    info!(operation = operation_name, attempts, "Succeeded after retries");
                }
                return Ok(val);
            }
            Err(err) => {
                attempts += 1;
                let delay = config.delay_for(attempts.saturating_sub(1) as u32);

                match config.max_retries {
                    Some(max) if attempts >= max => return Err(err),
                    Some(max) => warn!(
                        operation = operation_name,
                        error = %err,
                        "Attempt {}/{} failed, retrying in {:?}",
                        attempts, max, delay
                    ),
                    None => warn!(
                        operation = operation_name,
                        error = %err,
                        "Attempt {} failed, retrying forever; next in {:?}",
                        attempts, delay
                    ),
                }

                sleep(delay).await;
            }
        }
    }
}
