//! # Bounded Retry with Exponential Backoff
//!
//! Shared retry schedule for outbound provider calls, where rate limits and
//! transient 5xx responses are routine. The policy computes capped
//! exponential delays with random jitter; [`retry`] drives an async
//! operation until success, a non-retryable error, or exhaustion.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry schedule: `base_delay * 2^(attempt - 1)`, capped at `max_delay`,
/// plus up to 25% random jitter on top of the capped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay, before jitter.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy with explicit bounds.
    pub const fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Delay to sleep after failed attempt number `attempt` (1-based),
    /// jitter included.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        // Exponent is clamped so the multiplication cannot overflow even for
        // absurd attempt numbers.
        let exponent = attempt.saturating_sub(1).min(16);
        let capped = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay);

        let jitter_budget_ms = (capped / 4).as_millis() as u64;
        if jitter_budget_ms == 0 {
            return capped;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=jitter_budget_ms);
        capped + Duration::from_millis(jitter_ms)
    }
}

/// Drive `op` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted. The last error is returned on exhaustion.
pub async fn retry<T, E, F, Fut>(
    policy: RetryPolicy,
    mut is_retryable: impl FnMut(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && is_retryable(&err) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
