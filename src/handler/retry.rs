//! Retry with linear backoff.
//!
//! An operation is invoked once and, on failure, re-invoked up to
//! `max_retries` more times. The wait before retry `n` is `base_delay * n`
//! (1x, 2x, 3x...). A classified error with `retryable == false` stops the
//! sequence immediately. There is no shared state between sequences, and no
//! timeout: a sequence runs until success, a non-retryable failure, or
//! exhaustion.

use crate::logging::{log_debug, log_warn};
use crate::taxonomy::RaisedError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for [`ErrorHandler::handle_with_retry`](super::ErrorHandler::handle_with_retry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; retry `n` waits `n` times this
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1_000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// Upper bound on invocations of the operation
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Why a retry sequence gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The error was classified as not retryable.
    NonRetryable,
    /// All retries were used.
    Exhausted,
}

/// The last error of a failed sequence.
#[derive(Debug)]
pub struct RetryFailure {
    pub error: RaisedError,
    pub attempts: u32,
    pub reason: StopReason,
}

/// Run `operation` under `policy`. Does not log to the store or notify; the
/// handler does that with the returned failure.
pub async fn run_with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<RaisedError>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        log_debug!(
            attempt = attempt,
            max_attempts = policy.max_attempts(),
            "Executing operation with retry"
        );

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e.into(),
        };

        if !error.is_retryable() {
            log_debug!(
                attempt = attempt,
                category = %error.category(),
                "Operation failed with non-retryable error"
            );
            return Err(RetryFailure {
                error,
                attempts: attempt,
                reason: StopReason::NonRetryable,
            });
        }

        if attempt > policy.max_retries {
            log_warn!(
                attempts = attempt,
                error = %error,
                "Operation failed after all retry attempts"
            );
            return Err(RetryFailure {
                error,
                attempts: attempt,
                reason: StopReason::Exhausted,
            });
        }

        let delay = policy.delay_for_retry(attempt);
        log_debug!(
            attempt = attempt,
            delay_ms = delay.as_millis(),
            error = %error,
            "Operation failed, retrying after delay"
        );
        sleep(delay).await;
    }
}
