//! Pipeline configuration.
//!
//! Defaults match the batch discipline the platforms tolerate (10 workers,
//! 2-5 s jitter between submissions, 3 retries). Environment variables
//! override individual knobs; the CLI overrides on top of that.

use std::time::Duration;

// ==================== DEFAULTS ====================

const MAX_WORKERS: usize = 10;
const MIN_SUBMIT_DELAY_MS: u64 = 2_000;
const MAX_SUBMIT_DELAY_MS: u64 = 5_000;
const SKU_MAX_RETRIES: u32 = 3;
const SKU_RETRY_DELAY_SECS: u64 = 5;
const FETCH_MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 15;
const ELEMENT_WAIT_SECS: u64 = 10;
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u64(name: &str) -> Option<u64> {
    env_var(name).and_then(|s| s.parse().ok())
}

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Upper bound on concurrently running SKU tasks.
    pub max_workers: usize,
    /// Randomized pacing window between task submissions.
    pub min_submit_delay: Duration,
    pub max_submit_delay: Duration,
    /// Whole-SKU retry discipline (panicked attempts).
    pub sku_max_retries: u32,
    pub sku_retry_delay: Duration,
    /// Immediate fetch retries inside a connector.
    pub fetch_max_attempts: u32,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Bounded wait for result lists / detail containers to materialize.
    pub element_wait: Duration,
    /// WebDriver endpoint for the browser-driven connectors.
    pub webdriver_url: String,
    /// Optional cap on processed rows (None = whole file).
    pub row_limit: Option<usize>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_workers: MAX_WORKERS,
            min_submit_delay: Duration::from_millis(MIN_SUBMIT_DELAY_MS),
            max_submit_delay: Duration::from_millis(MAX_SUBMIT_DELAY_MS),
            sku_max_retries: SKU_MAX_RETRIES,
            sku_retry_delay: Duration::from_secs(SKU_RETRY_DELAY_SECS),
            fetch_max_attempts: FETCH_MAX_ATTEMPTS,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            element_wait: Duration::from_secs(ELEMENT_WAIT_SECS),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            row_limit: None,
        }
    }
}

impl MatcherConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(workers) = env_u64("SHELFMATCH_MAX_WORKERS") {
            config.max_workers = (workers as usize).max(1);
        }
        if let Some(ms) = env_u64("SHELFMATCH_MIN_SUBMIT_DELAY_MS") {
            config.min_submit_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("SHELFMATCH_MAX_SUBMIT_DELAY_MS") {
            config.max_submit_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("SHELFMATCH_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = env_var("WEBDRIVER_URL") {
            config.webdriver_url = url;
        }
        config
    }

    /// Pick a jittered pacing delay from the configured window.
    pub fn submit_delay(&self) -> Duration {
        let min = self.min_submit_delay.as_millis() as u64;
        let max = self.max_submit_delay.as_millis() as u64;
        if max <= min {
            return self.min_submit_delay;
        }
        Duration::from_millis(fastrand::u64(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_delay_stays_inside_window() {
        let config = MatcherConfig {
            min_submit_delay: Duration::from_millis(10),
            max_submit_delay: Duration::from_millis(20),
            ..Default::default()
        };
        for _ in 0..50 {
            let d = config.submit_delay();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
    }

    #[test]
    fn degenerate_window_is_tolerated() {
        let config = MatcherConfig {
            min_submit_delay: Duration::from_millis(5),
            max_submit_delay: Duration::from_millis(5),
            ..Default::default()
        };
        assert_eq!(config.submit_delay(), Duration::from_millis(5));
    }
}
