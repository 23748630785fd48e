use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::error::{GithubError, Result};

/// Exponential backoff wrapped around a fallible async call.
///
/// Attempt `n` (zero based) that fails waits `base_delay * 2^n` plus up to one
/// second of jitter before the next try. After `max_retries` extra attempts the
/// last error is returned as is.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, jitter: bool) -> Self {
        Self {
            max_retries,
            base_delay,
            jitter,
        }
    }

    /// No retries, no waiting.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, false)
    }

    /// Wait before attempt `attempt + 1`, jitter excluded.
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay_for(attempt);
        if self.jitter {
            base + Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0))
        } else {
            base
        }
    }

    pub async fn run<T, F, Fut>(&self, label: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_if(label, GithubError::is_retryable, op).await
    }

    /// Like [`run`](Self::run), but only errors accepted by `retryable` are retried.
    pub async fn run_if<T, F, Fut, P>(&self, label: &str, retryable: P, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&GithubError) -> bool,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(call = label, attempts = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_retries && retryable(&e) => {
                    let wait = self.delay_for(attempt);
                    warn!(
                        call = label,
                        attempt = attempt + 1,
                        error = %e,
                        "Attempt failed, retrying in {:.2}s",
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
