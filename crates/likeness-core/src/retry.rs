//! Bounded retry with exponential backoff and jitter.
//!
//! This is the only place a worker sleeps. Rate limits and transient failures
//! are retried; auth failures and undecodable responses fail fast.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::GenerationConfig;
use crate::error::GenerationError;

/// Upper bound of the random jitter fraction added to each delay.
pub const MAX_JITTER: f64 = 0.25;

/// No single backoff wait exceeds this.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Determine whether a failure is worth another attempt.
///
/// Retryable: rate limits (429), timeouts, connection errors, 5xx.
/// Non-retryable: auth failures, undecodable responses, local errors.
pub fn is_retryable(error: &GenerationError) -> bool {
    matches!(
        error,
        GenerationError::RateLimited(_) | GenerationError::Transient(_)
    )
}

/// Delay to wait before attempt `attempt` (1-based, so the first retry is 2).
///
/// `base_delay * 2^(attempt-2) * (1 + jitter)`, with jitter clamped to
/// `[0, MAX_JITTER]` and the result capped at [`MAX_BACKOFF`].
pub fn backoff_duration(attempt: u32, base_delay_ms: u64, jitter: f64) -> Duration {
    let exponent = attempt.saturating_sub(2);
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(exponent));
    let jittered = delay as f64 * (1.0 + jitter.clamp(0.0, MAX_JITTER));
    let capped = jittered.min(MAX_BACKOFF.as_millis() as f64);
    Duration::from_millis(capped as u64)
}

fn sample_jitter() -> f64 {
    rand::thread_rng().gen_range(0.0..=MAX_JITTER)
}

/// Outcome of a retried operation plus the number of attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, GenerationError>,
    pub attempts: u32,
}

/// Retry settings for one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Run `attempt_fn` until it succeeds, fails permanently, or runs out of
    /// attempts.
    ///
    /// `attempt_fn` receives the 1-based attempt number. Exhausting every
    /// attempt yields `RetriesExhausted` wrapping the last failure. If
    /// `cancel` fires during a backoff wait, the last failure is returned
    /// without another attempt.
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut attempt_fn: F,
    ) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let base_delay_ms = self.base_delay.as_millis() as u64;
        let mut attempt = 1;

        loop {
            let error = match attempt_fn(attempt).await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) => e,
            };

            if !is_retryable(&error) {
                tracing::debug!("Attempt {attempt} failed permanently: {error}");
                return Attempted {
                    result: Err(error),
                    attempts: attempt,
                };
            }

            if attempt >= max_attempts {
                return Attempted {
                    result: Err(GenerationError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    }),
                    attempts: attempt,
                };
            }

            let delay = backoff_duration(attempt + 1, base_delay_ms, sample_jitter());
            tracing::warn!(
                "Attempt {attempt}/{max_attempts} failed ({error}); retrying in {delay:?}"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Cancelled during backoff after attempt {attempt}");
                    return Attempted {
                        result: Err(error),
                        attempts: attempt,
                    };
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
