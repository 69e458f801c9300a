//! HTTP fetch layer for the plain-HTTP connector.
//!
//! Requests go out through a Chrome-emulating client with a user agent
//! chosen once at construction from a small rotation pool. Redirects are
//! followed manually so intermediate hops stay visible in the logs, and a
//! 403 gets one retry with a mobile user agent before giving up. A fetch
//! that keeps failing degrades to `None`; callers treat that as "page not
//! available", never as a batch-level error.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};
use url::Url;

use crate::retry::RetryPolicy;

const MAX_REDIRECTS: usize = 3;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

const MOBILE_UA: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36";

/// Pick a request identity from the rotation pool.
pub fn pick_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}

pub struct HttpFetcher {
    client: wreq::Client,
    user_agent: &'static str,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_attempts: u32) -> Result<Self> {
        let client = wreq::Client::builder()
            .emulation(wreq_util::Emulation::Chrome131)
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("failed to build http client: {e}"))?;
        Ok(Self {
            client,
            user_agent: pick_user_agent(),
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(500)),
        })
    }

    /// Fetch a page body, retrying transient failures a bounded number of
    /// times. `None` means the page could not be fetched at all.
    pub async fn fetch_html(&self, url: &str) -> Option<String> {
        match self
            .retry
            .run(url, || self.fetch_html_once(url.to_string()))
            .await
        {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("giving up on {}: {:#}", url, e);
                None
            }
        }
    }

    async fn fetch_html_once(&self, original_url: String) -> Result<String> {
        let mut current_url = original_url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let mut resp = self
                .client
                .get(&current_url)
                .header("User-Agent", self.user_agent)
                .send()
                .await
                .map_err(|e| anyhow!("request failed for {current_url}: {e}"))?;
            let mut status = resp.status();

            // Forbidden often means the desktop identity was fingerprinted;
            // one mobile retry tends to get through.
            if status.as_u16() == 403 {
                debug!("HTTP 403, retrying with mobile UA url={}", current_url);
                resp = self
                    .client
                    .get(&current_url)
                    .header("User-Agent", MOBILE_UA)
                    .send()
                    .await
                    .map_err(|e| anyhow!("mobile retry failed for {current_url}: {e}"))?;
                status = resp.status();
            }

            let code = status.as_u16();

            if status.is_success() {
                let text = resp
                    .text()
                    .await
                    .map_err(|e| anyhow!("failed to read body from {current_url}: {e}"))?;
                if text.is_empty() {
                    return Err(anyhow!("empty body from {current_url}"));
                }
                debug!("fetched {} bytes url={}", text.len(), current_url);
                return Ok(text);
            }

            if (300..400).contains(&code) {
                if let Some(loc) = resp.headers().get("location").and_then(|h| h.to_str().ok()) {
                    let next_url = match Url::parse(&current_url) {
                        Ok(base) => base
                            .join(loc)
                            .map(|u| u.to_string())
                            .unwrap_or_else(|_| loc.to_string()),
                        Err(_) => loc.to_string(),
                    };
                    debug!("redirect {} -> {}", current_url, next_url);
                    current_url = next_url;
                    continue;
                }
                return Err(anyhow!(
                    "HTTP {code} with no usable Location header url={current_url}"
                ));
            }

            return Err(anyhow!("HTTP {code} url={current_url}"));
        }

        Err(anyhow!(
            "exceeded redirect limit starting from {original_url}"
        ))
    }
}
