use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Reusable exponential-backoff policy. The caller decides which error
/// causes are worth retrying; everything else fails on the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Run `op` until it succeeds, the error is not retryable, or the
    /// attempt cap is reached. Backoff doubles per attempt.
    pub async fn run<T, E, F, Fut, R>(&self, mut op: F, retryable: R) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts.max(1) || !retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    warn!("attempt {} failed ({}), retrying in {:?}", attempt, err, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
