//! # Retry Policy
//!
//! Bounded exponential backoff for remote API calls.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::error_classifier::classify;
use crate::client::ApiError;
use crate::config::RetryConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter_enabled: bool,
    max_jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            multiplier: config.multiplier,
            jitter_enabled: config.jitter_enabled,
            max_jitter: config.max_jitter,
        }
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter_enabled: false,
            max_jitter: 0.0,
        }
    }

    /// Retries without delay; keeps tests fast
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::no_retry()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `attempt` (1 = first retry), without jitter
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        // Capped in float seconds first; the uncapped product may not fit a Duration
        let seconds = (self.base_delay.as_secs_f64() * self.multiplier.powi(exponent))
            .min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(seconds).unwrap_or(self.max_delay)
    }

    /// Apply jitter to a delay to prevent thundering herd
    fn apply_jitter(&self, delay: Duration) -> Duration {
        use rand::Rng;

        let jitter_range = delay.mul_f64(self.max_jitter);
        if !self.jitter_enabled || jitter_range.is_zero() {
            return delay;
        }

        let mut rng = rand::thread_rng();
        let jitter = jitter_range.mul_f64(rng.gen_range(0.0..=1.0));

        // Add or subtract jitter randomly
        if rng.gen_bool(0.5) {
            delay.saturating_add(jitter).min(self.max_delay)
        } else {
            delay.saturating_sub(jitter)
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = %operation_name, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let category = classify(&err);
                    if !category.is_retryable() || attempt >= self.max_attempts {
                        return Err(err);
                    }

                    let delay = self.apply_jitter(self.delay_for_attempt(attempt));
                    warn!(
                        operation = %operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        category = %category,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying remote call"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
