//! Bounded retry of fallible async operations.
//!
//! Kept separate from the call sites so the policy can be exercised with a
//! stub operation. The delay is fixed rather than exponential: callers here
//! retry short fetches or whole-SKU attempts, and pacing between tasks is
//! already handled by the scheduler.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or `max_attempts` is exhausted, sleeping
    /// `delay` between attempts. Returns the last error on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err = None;
        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        "attempt {}/{} failed for {}: {:#}",
                        attempt, self.max_attempts, label, e
                    );
                    last_err = Some(e);
                    if attempt < self.max_attempts {
                        sleep(self.delay).await;
                    }
                }
            }
        }
        Err(last_err.expect("at least one attempt"))
    }
}
