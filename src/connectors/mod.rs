//! Platform connectors.
//!
//! Every platform exposes the same two-operation contract: find the best
//! matching listing for a SKU, then pull structured fields off that listing.
//! What differs per platform is the fetch mechanism (plain HTTP vs. a
//! rendered browser page) and the page structure; both stay encapsulated
//! behind the trait so the orchestrator never branches on platform type.

use async_trait::async_trait;
use scraper::{Html, Selector};

mod amazon;
mod blinkit;
mod zepto;

pub use amazon::AmazonConnector;
pub use blinkit::BlinkitConnector;
pub use zepto::ZeptoConnector;

// ==================== PLATFORM SET ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Amazon,
    Blinkit,
    Zepto,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Amazon, Platform::Blinkit, Platform::Zepto];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Blinkit => "blinkit",
            Platform::Zepto => "zepto",
        }
    }
}

// ==================== RECORDS ====================

/// Structured fields extracted from one listing page. Each field besides the
/// source URL is independently optional: partial extraction is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub url: String,
    pub mrp: Option<String>,
    pub sale_price: Option<String>,
    pub quantity: Option<String>,
    pub uom: Option<String>,
}

impl ProductDetails {
    pub fn new(url: String) -> Self {
        Self {
            url,
            mrp: None,
            sale_price: None,
            quantity: None,
            uom: None,
        }
    }
}

// ==================== CONTRACT ====================

/// The capability set shared by all platforms.
///
/// `Ok(None)` is the normal "no match / page gave nothing" outcome. `Err` is
/// reserved for infrastructure failures that survived the connector's own
/// bounded retries; the orchestrator records those as absent for the
/// platform and moves on.
#[async_trait]
pub trait Connector: Send + Sync {
    fn platform(&self) -> Platform;

    /// Locate the best-matching listing for the SKU, returning its URL.
    async fn search_product(&self, name: &str, uom: &str) -> anyhow::Result<Option<String>>;

    /// Extract price/quantity fields from a listing located by
    /// `search_product`.
    async fn extract_details(&self, url: &str) -> anyhow::Result<Option<ProductDetails>>;
}

// ==================== SHARED EXTRACTION HELPERS ====================

/// Reduce a displayed price to digits and decimal point; `None` when nothing
/// numeric remains.
pub(crate) fn clean_price(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// First selector in the chain that yields non-empty text in the document.
pub(crate) fn text_from_selectors(html: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in html.select(&selector) {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

/// First selector in the chain that yields an `href`.
pub(crate) fn href_from_selectors(html: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in html.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if !href.is_empty() {
                    return Some(href.to_string());
                }
            }
        }
    }
    None
}

/// Resolve a possibly-relative listing link against the platform base URL.
pub(crate) fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{base_url}{href}")
    } else {
        href.to_string()
    }
}
