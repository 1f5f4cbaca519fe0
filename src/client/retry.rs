//! Retry backoff policy
//!
//! Exponential backoff with jitter between attempts. The jitter term keeps
//! concurrent retries from synchronizing against a recovering ledger.

use std::time::Duration;

use crate::config::RetryConfig;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total tries including the initial attempt
    pub max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }

    /// Backoff before the attempt following `attempt` (1-based).
    ///
    /// Doubles per attempt, capped at `max_backoff`, plus up to 50% jitter.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let base = self
            .initial_backoff
            .saturating_mul(1u32 << exp)
            .min(self.max_backoff);
        let jitter = base.mul_f64(rand::random::<f64>() * 0.5);
        (base + jitter).min(self.max_backoff)
    }
}
