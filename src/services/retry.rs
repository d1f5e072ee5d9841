use std::{fmt::Display, future::Future, time::Duration};

/// How many times to try an outbound call and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled after every retry
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error; holds the last one
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error the predicate refused to retry
    Aborted(E),
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up.
///
/// The operation receives the 1-based attempt number. Between attempts the
/// current delay is slept and then doubled.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !is_retryable(&error) {
            tracing::debug!(label, attempt, error = %error, "Non-retryable failure");
            return Err(RetryError::Aborted(error));
        }

        if attempt >= max_attempts {
            tracing::warn!(label, attempts = attempt, error = %error, "Retries exhausted");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: error,
            });
        }

        tracing::warn!(
            label,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, backing off before retry"
        );

        tokio::time::sleep(delay).await;
        delay = delay.saturating_mul(2);
        attempt += 1;
    }
}
