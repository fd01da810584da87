//! Bounded retry for transient billing provider failures.
//!
//! An explicit loop with an attempt counter and a growing delay, returning
//! a tagged outcome instead of re-raising from recursion. Only errors the
//! provider marks retryable (rate limits, network) are retried.

use std::future::Future;
use std::time::Duration;

use crate::ports::BillingError;

/// Retry policy: how many attempts, and the base delay between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Base delay; attempt N waits `base_delay * N` before retrying.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps, for tests.
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The operation succeeded within the attempt budget.
    Succeeded(T),
    /// Attempts were exhausted; carries the last error.
    Exhausted(BillingError),
    /// The operation failed with a non-retryable error.
    Failed(BillingError),
}

/// Runs `op` up to `policy.max_attempts` times, sleeping between retryable
/// failures.
pub async fn retry_transient<T, F, Fut>(policy: RetryPolicy, mut op: F) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BillingError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return RetryOutcome::Succeeded(value),
            Err(err) if !err.retryable => return RetryOutcome::Failed(err),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    return RetryOutcome::Exhausted(err);
                }
                let delay = policy.base_delay * attempt;
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient billing provider error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
