//! Blinkit connector: WebDriver-rendered pages.
//!
//! Blinkit ships an empty shell to plain HTTP clients, so both operations
//! render the page in a headless browser. The styled-component class names
//! rotate between deploys; the generated names observed in production lead
//! each fallback chain, with looser structural selectors behind them.

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

const BASE_URL: &str = "https://blinkit.com";

const CARD_SELECTORS: &[&str] = &[".product-card", "div[data-test-id='product-card']", "a[href*='/prn/']"];

const CARD_NAME_SELECTORS: &[&str] = &[
    ".Product__ProductName-sc-11dk8zk-3",
    "[class*='ProductName']",
    ".product-card-name",
];

const DETAIL_CONTAINER_SELECTORS: &[&str] = &[".product-detail", "[class*='ProductInfo']", "#app"];

const MRP_SELECTORS: &[&str] = &[
    ".ProductInfo__OriginalPrice-sc-urkcd7-4",
    "[class*='OriginalPrice']",
    "span.tw-line-through",
];

const SALE_PRICE_SELECTORS: &[&str] = &[
    ".ProductInfo__DiscountedPrice-sc-urkcd7-3",
    "[class*='DiscountedPrice']",
    "[class*='ProductInfo'] [class*='Price']",
];

const TITLE_SELECTORS: &[&str] = &[
    ".ProductHeader__StyledProductHeader-sc-4rfq5f-0 h1",
    "[class*='ProductHeader'] h1",
    "h1",
];

pub struct BlinkitConnector {
    webdriver_url: String,
    user_agent: &'static str,
    element_wait: Duration,
    session_retry: RetryPolicy,
}

impl BlinkitConnector {
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
        format!("{BASE_URL}/search/{}", urlencoding::encode(query.trim()))
    }

    async fn acquire(&self) -> Result<BrowserSession> {
        self.session_retry
            .run("blinkit webdriver session", || {
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
        debug!("blinkit search: {}", search_url);

        if let Err(e) = session.goto(&search_url).await {
            warn!("blinkit navigation failed: {:#}", e);
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
        debug!("blinkit returned {} candidates for {:?}", candidates.len(), name);

        let best = matcher::select_best(name, uom, &candidates);
        if let Some(url) = &best {
            info!("blinkit match for {:?}: {}", name, url);
        }
        Ok(best)
    }

    async fn extract_in_session(
        &self,
        session: &BrowserSession,
        url: &str,
    ) -> Result<Option<ProductDetails>> {
        if let Err(e) = session.goto(url).await {
            warn!("blinkit navigation failed: {:#}", e);
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

        if let Some(title) = session.first_text(TITLE_SELECTORS).await {
            if let Some((quantity, uom)) = units::extract_quantity_and_unit(&title) {
                details.quantity = Some(quantity);
                details.uom = Some(uom);
            }
        }

        Ok(Some(details))
    }
}

#[async_trait]
impl Connector for BlinkitConnector {
    fn platform(&self) -> Platform {
        Platform::Blinkit
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
