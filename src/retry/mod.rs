//! Bounded retry with configurable backoff for flaky store operations.
//!
//! Provides [`retry`], a generic decorator over any fallible async
//! operation. The number of attempts and the delay strategy between them are
//! configuration ([`RetryPolicy`], [`Backoff`]), not hardcoded behavior:
//! immediate re-invocation and exponential backoff are both selectable.
//!
//! When every attempt fails the caller receives a distinguishable terminal
//! error, [`RetriesExhausted`], carrying the attempt count and the last
//! underlying failure. No code path swallows the final error or returns
//! without a definite outcome.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Delay strategy applied between failed attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Re-invoke immediately, no suspension.
    None,
    /// Wait a constant delay before every retry.
    Fixed(Duration),
    /// Start at `initial` and multiply the delay after each failed attempt.
    Exponential { initial: Duration, multiplier: f64 },
}

impl Backoff {
    /// Delay to apply after the `failures`-th failed attempt (1-based).
    fn delay_after(&self, failures: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, multiplier } => {
                let scale = multiplier.powi(failures.saturating_sub(1) as i32);
                Duration::from_secs_f64(initial.as_secs_f64() * scale)
            }
        }
    }
}

/// Configuration for [`retry`].
///
/// The default matches the service's toggle wrapper: 3 attempts total,
/// exponential backoff starting at 1000 ms and doubling after every failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first try. A value of 0 is
    /// treated as 1: the operation always runs at least once.
    pub max_attempts: u32,
    /// Delay strategy between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(1000),
                multiplier: 2.0,
            },
        }
    }
}

impl RetryPolicy {
    /// Retry up to `max_attempts` times with no delay in between.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::None,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::immediate(1)
    }
}

/// Terminal error: every attempt failed.
///
/// Wraps the last underlying error so the original failure is preserved on
/// the `source` chain.
#[derive(Debug, Error)]
#[error("operation failed after {attempts} attempts")]
pub struct RetriesExhausted<E> {
    /// How many times the operation was invoked.
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Runs `op` until it succeeds or the policy's attempts are exhausted.
///
/// Returns the first `Ok` value, or [`RetriesExhausted`] wrapping the last
/// error once `policy.max_attempts` invocations have all failed. Backoff
/// delays suspend on [`tokio::time::sleep`]; they are not cancellable except
/// by dropping the future.
///
/// # Examples
///
/// ```
/// use taskboard::retry::{retry, RetryPolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let result: Result<u32, _> = retry(&RetryPolicy::immediate(3), || async {
///     Ok::<_, std::io::Error>(7)
/// })
/// .await;
/// assert_eq!(result.unwrap(), 7);
/// # }
/// ```
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, mut op: F) -> Result<T, RetriesExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "retry succeeded");
                }
                return Ok(value);
            }
            Err(err) if attempt == max_attempts => {
                warn!(attempt, err = ?err, "all retry attempts exhausted");
                return Err(RetriesExhausted {
                    attempts: max_attempts,
                    source: err,
                });
            }
            Err(err) => {
                let delay = policy.backoff.delay_after(attempt);
                warn!(
                    attempt,
                    max = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    err = ?err,
                    "attempt failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    unreachable!("loop returns on the final attempt")
}
