//! Bounded, fixed-delay retry for pool initialization
//!
//! The usual failure at startup is a database that is still booting, so a
//! short constant delay is used instead of exponential backoff.

use crate::db::provider::Connector;
use crate::error::{DbError, DbResult};
use std::time::Duration;

/// How many times to try opening the pool, and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per initialization sequence (never less than 1)
    pub max_retries: u32,
    /// Fixed pause between two attempts
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(3000))
    }
}

/// Open a pool through `connector`, retrying per `policy`.
///
/// Attempts run strictly one after another. After the last failed attempt
/// the error is wrapped in [`DbError::RetriesExhausted`].
pub async fn open_with_retry<C: Connector>(connector: &C, policy: RetryPolicy) -> DbResult<C::Pool> {
    let max = policy.max_retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        if attempt == 1 {
            tracing::info!("Opening database connection pool");
        } else {
            tracing::info!(attempt, max, "Retrying database connection");
        }

        match connector.open().await {
            Ok(pool) => {
                tracing::info!(attempt, "Database connection established");
                return Ok(pool);
            }
            Err(err) => {
                tracing::warn!(attempt, max, error = %err, "Database connection attempt failed");
                if attempt >= max {
                    tracing::error!(attempts = attempt, "Giving up on database connection");
                    return Err(DbError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                tracing::debug!(delay_ms = policy.retry_delay.as_millis() as u64, "Waiting before next attempt");
                tokio::time::sleep(policy.retry_delay).await;
            }
        }
    }
}
