//! Retry with backoff for fallible generation calls.
//!
//! The pipeline wraps each per-module code-generation call in a
//! [`RetryPolicy`] so a transiently failing generator (e.g. a remote
//! implementation) gets a bounded number of attempts with growing delays.
//! The selection core never retries — it has no failure modes.

use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy configuration.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first (must be ≥ 1).
    pub max_attempts: usize,
    /// Delay schedule between attempts.
    pub strategy: RetryStrategy,
}

/// Backoff schedule between attempts.
#[derive(Clone, Debug)]
pub enum RetryStrategy {
    /// Same delay between every attempt.
    Fixed(Duration),
    /// Delay multiplies each attempt, capped at `max_delay`.
    Exponential {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Cap on any single delay.
        max_delay: Duration,
        /// Growth factor per attempt.
        multiplier: f64,
    },
    /// Delay grows by a fixed increment each attempt.
    Linear {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Added to the delay after each attempt.
        increment: Duration,
    },
}

impl RetryPolicy {
    /// Policy with a fixed delay between attempts.
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            strategy: RetryStrategy::Fixed(delay),
        }
    }

    /// Policy with exponential backoff (×2 per attempt, 60 s cap).
    pub fn exponential(max_attempts: usize, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            strategy: RetryStrategy::Exponential {
                initial_delay,
                max_delay: Duration::from_secs(60),
                multiplier: 2.0,
            },
        }
    }

    /// Policy with linearly growing delays.
    pub fn linear(max_attempts: usize, initial_delay: Duration, increment: Duration) -> Self {
        Self {
            max_attempts,
            strategy: RetryStrategy::Linear {
                initial_delay,
                increment,
            },
        }
    }

    /// Run `f` until it succeeds or attempts are exhausted.
    ///
    /// # Errors
    ///
    /// Returns the last error once `max_attempts` have failed.
    pub async fn retry<F, Fut, T, E>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(attempt, "retry: operation succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        error = %e,
                        "retry: operation failed"
                    );
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                    let delay = self.delay_for(attempt);
                    debug!(delay_ms = delay.as_millis() as u64, "retry: backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Delay before the retry following the given (1-based) attempt.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        match &self.strategy {
            RetryStrategy::Fixed(delay) => *delay,
            RetryStrategy::Exponential {
                initial_delay,
                max_delay,
                multiplier,
            } => {
                let ms = initial_delay.as_millis() as f64 * multiplier.powi(attempt as i32 - 1);
                Duration::from_millis(ms as u64).min(*max_delay)
            }
            RetryStrategy::Linear {
                initial_delay,
                increment,
            } => *initial_delay + *increment * (attempt as u32 - 1),
        }
    }
}

/// Retry only while `should_retry` approves the error.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once attempts
/// are exhausted.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut f: F,
    mut should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    warn!(error = %e, "retry: error is not retryable");
                    return Err(e);
                }
                if attempt >= policy.max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }
    }
}

/// Add up to 25% random jitter to a delay, spreading simultaneous retries.
pub fn with_jitter(duration: Duration) -> Duration {
    use rand::Rng;
    let quarter = (duration.as_millis() / 4).max(1) as u64;
    let jitter = rand::thread_rng().gen_range(0..quarter);
    duration + Duration::from_millis(jitter)
}
