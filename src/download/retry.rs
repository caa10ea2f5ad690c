//! Retry logic for outbound requests

use crate::error::ApiError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Boxed future returned by a retried operation
pub type RetryFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return delay;
        }
        let range = delay.as_millis() as f64 * self.jitter_factor;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * range;
        delay + Duration::from_millis(jitter.abs() as u64)
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        let next = Duration::from_millis((delay.as_millis() as f64 * self.backoff_multiplier) as u64);
        next.min(self.max_delay)
    }
}

/// Runs an operation until it succeeds, fails permanently or runs out of retries
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `func`, retrying only errors where [`ApiError::is_retryable`] holds
    pub async fn execute<F, T>(&self, mut func: F) -> Result<T, ApiError>
    where
        F: FnMut() -> RetryFuture<T>,
    {
        let mut delay = self.config.initial_delay;
        let mut attempt = 0;

        loop {
            match func().await {
                Ok(result) => return Ok(result),
                Err(error) if error.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let wait = self.config.jittered(delay);
                    debug!(
                        "Attempt {} failed ({}), retrying in {:?}",
                        attempt, error, wait
                    );
                    tokio::time::sleep(wait).await;
                    delay = self.config.next_delay(delay);
                }
                Err(error) => return Err(error),
            }
        }
    }
}
