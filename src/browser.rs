//! WebDriver session wrapper for platforms that only render listings
//! client-side.
//!
//! A session is acquired per search/extract call and released on every exit
//! path, which bounds peak browser memory when the batch runs across
//! hundreds of SKUs. Waiting for content is a bounded poll: a timeout means
//! "nothing rendered", a normal outcome rather than an error.

use std::time::Duration;

use anyhow::{anyhow, Result};
use thirtyfour::prelude::*;
use tokio::time::{sleep, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct BrowserSession {
    driver: WebDriver,
}

impl BrowserSession {
    /// Launch a headless Chrome session against the configured WebDriver
    /// endpoint with the given request identity.
    pub async fn launch(webdriver_url: &str, user_agent: &str) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--headless")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg(&format!("user-agent={user_agent}"))?;

        let driver = WebDriver::new(webdriver_url, caps)
            .await
            .map_err(|e| anyhow!("failed to start WebDriver session at {webdriver_url}: {e}"))?;
        Ok(Self { driver })
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| anyhow!("navigation to {url} failed: {e}"))
    }

    /// Poll until any selector in the chain yields at least one element.
    /// `false` on deadline, never an error.
    pub async fn wait_for_any(&self, selectors: &[&str], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            for selector in selectors {
                if let Ok(found) = self.driver.find_all(By::Css(*selector)).await {
                    if !found.is_empty() {
                        return true;
                    }
                }
            }
            if Instant::now() >= deadline {
                debug!("no element materialized for {:?} within {:?}", selectors, timeout);
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// First selector in the chain that yields a non-empty element list.
    pub async fn elements(&self, selectors: &[&str]) -> Vec<WebElement> {
        for selector in selectors {
            if let Ok(found) = self.driver.find_all(By::Css(*selector)).await {
                if !found.is_empty() {
                    return found;
                }
            }
        }
        Vec::new()
    }

    /// Document-level text lookup through a selector fallback chain.
    pub async fn first_text(&self, selectors: &[&str]) -> Option<String> {
        for selector in selectors {
            if let Ok(found) = self.driver.find_all(By::Css(*selector)).await {
                for element in found {
                    if let Ok(text) = element.text().await {
                        let text = text.trim().to_string();
                        if !text.is_empty() {
                            return Some(text);
                        }
                    }
                }
            }
        }
        None
    }

    /// Release the browser. Failure to quit only costs a stale session, so
    /// it is logged and swallowed.
    pub async fn close(self) {
        if let Err(e) = self.driver.quit().await {
            debug!("failed to quit WebDriver session: {e}");
        }
    }
}

/// Text of the first matching child, tried through a selector fallback
/// chain.
pub async fn child_text(element: &WebElement, selectors: &[&str]) -> Option<String> {
    for selector in selectors {
        if let Ok(child) = element.find(By::Css(*selector)).await {
            if let Ok(text) = child.text().await {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// `href` of the first matching child link.
pub async fn child_href(element: &WebElement, selectors: &[&str]) -> Option<String> {
    for selector in selectors {
        if let Ok(child) = element.find(By::Css(*selector)).await {
            if let Ok(Some(href)) = child.attr("href").await {
                if !href.is_empty() {
                    return Some(href);
                }
            }
        }
    }
    None
}
