//! Zepto connector: WebDriver-rendered pages.
//!
//! Same shape as the Blinkit connector with Zepto's page structure. One
//! platform quirk: pack size often lives in a separate weight element rather
//! than the title, so title and weight text are combined before the unit
//! pass.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::browser::{child_href, child_text, BrowserSession};
use crate::connectors::{absolutize, clean_price, Connector, Platform, ProductDetails};
use crate::fetch::pick_user_agent;
use crate::matcher::{self, Candidate};
use crate::retry::RetryPolicy;
use crate::units;

const BASE_URL: &str = "https://www.zeptonow.com";

const CARD_SELECTORS: &[&str] = &[
    ".search-item-card",
    "[data-testid='product-card']",
    "a[href*='/pn/']",
];

const CARD_NAME_SELECTORS: &[&str] = &[
    ".product-name",
    "[data-testid='product-card-name']",
    "h5",
];

const DETAIL_CONTAINER_SELECTORS: &[&str] = &[
    ".product-detail-container",
    "[data-testid='pdp-product-name']",
    "#__next",
];

const MRP_SELECTORS: &[&str] = &[
    ".strikethrough-price",
    "span.line-through",
    "[class*='strike']",
];

const SALE_PRICE_SELECTORS: &[&str] = &[
    ".actual-price",
    "[data-testid='pdp-price']",
    "[class*='selling-price']",
];

const TITLE_SELECTORS: &[&str] = &[".product-title", "[data-testid='pdp-product-name']", "h1"];

const WEIGHT_SELECTORS: &[&str] = &[".product-weight", "[data-testid='pdp-weight']"];

pub struct ZeptoConnector {
    webdriver_url: String,
    user_agent: &'static str,
    element_wait: Duration,
    session_retry: RetryPolicy,
}

impl ZeptoConnector {
    pub fn new(webdriver_url: String, element_wait: Duration) -> Self {
        Self {
            webdriver_url,
            user_agent: pick_user_agent(),
            element_wait,
            session_retry: RetryPolicy::new(2, Duration::from_secs(1)),
        }
    }

    fn search_url(name: &str, uom: &str) -> String {
        let query = format!("{} {}", matcher::simplified_query(name), uom.trim());
        format!("{BASE_URL}/search?q={}", urlencoding::encode(query.trim()))
    }

    async fn acquire(&self) -> Result<BrowserSession> {
        self.session_retry
            .run("zepto webdriver session", || {
                BrowserSession::launch(&self.webdriver_url, self.user_agent)
            })
            .await
    }

    async fn search_in_session(
        &self,
        session: &BrowserSession,
        name: &str,
        uom: &str,
    ) -> Result<Option<String>> {
        let search_url = Self::search_url(name, uom);
        debug!("zepto search: {}", search_url);

        if let Err(e) = session.goto(&search_url).await {
            warn!("zepto navigation failed: {:#}", e);
            return Ok(None);
        }
        if !session.wait_for_any(CARD_SELECTORS, self.element_wait).await {
            return Ok(None);
        }

        let mut candidates = Vec::new();
        for card in session.elements(CARD_SELECTORS).await {
            let Some(display_name) = child_text(&card, CARD_NAME_SELECTORS).await else {
                continue;
            };
            let href = match card.attr("href").await {
                Ok(Some(href)) if !href.is_empty() => Some(href),
                _ => child_href(&card, &["a"]).await,
            };
            let Some(href) = href else { continue };
            candidates.push(Candidate {
                display_name,
                url: absolutize(BASE_URL, &href),
            });
        }
        debug!("zepto returned {} candidates for {:?}", candidates.len(), name);

        let best = matcher::select_best(name, uom, &candidates);
        if let Some(url) = &best {
            info!("zepto match for {:?}: {}", name, url);
        }
        Ok(best)
    }

    async fn extract_in_session(
        &self,
        session: &BrowserSession,
        url: &str,
    ) -> Result<Option<ProductDetails>> {
        if let Err(e) = session.goto(url).await {
            warn!("zepto navigation failed: {:#}", e);
            return Ok(None);
        }
        if !session
            .wait_for_any(DETAIL_CONTAINER_SELECTORS, self.element_wait)
            .await
        {
            return Ok(None);
        }

        let mut details = ProductDetails::new(url.to_string());
        details.mrp = session
            .first_text(MRP_SELECTORS)
            .await
            .as_deref()
            .and_then(clean_price);
        details.sale_price = session
            .first_text(SALE_PRICE_SELECTORS)
            .await
            .as_deref()
            .and_then(clean_price);

        // Pack size can live in the weight element instead of the title.
        let title = session.first_text(TITLE_SELECTORS).await.unwrap_or_default();
        let weight = session.first_text(WEIGHT_SELECTORS).await.unwrap_or_default();
        let combined = format!("{title} {weight}");
        if let Some((quantity, uom)) = units::extract_quantity_and_unit(&combined) {
            details.quantity = Some(quantity);
            details.uom = Some(uom);
        }

        Ok(Some(details))
    }
}

#[async_trait]
impl Connector for ZeptoConnector {
    fn platform(&self) -> Platform {
        Platform::Zepto
    }

    async fn search_product(&self, name: &str, uom: &str) -> Result<Option<String>> {
        let session = self.acquire().await?;
        let outcome = self.search_in_session(&session, name, uom).await;
        session.close().await;
        outcome
    }

    async fn extract_details(&self, url: &str) -> Result<Option<ProductDetails>> {
        let session = self.acquire().await?;
        let outcome = self.extract_in_session(&session, url).await;
        session.close().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_is_percent_encoded() {
        let url = ZeptoConnector::search_url("Parachute Coconut Oil", "200ml");
        assert_eq!(url, "https://www.zeptonow.com/search?q=parachute%20oil%20200ml");
    }
}
