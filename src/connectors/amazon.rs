//! Amazon connector: plain HTTP fetch plus HTML parsing.
//!
//! Amazon serves usable server-rendered markup, so no browser is involved.
//! Search-result cards and detail fields move around between page variants;
//! every lookup goes through an ordered selector fallback chain.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::connectors::{
    absolutize, clean_price, href_from_selectors, text_from_selectors, Connector, Platform,
    ProductDetails,
};
use crate::fetch::HttpFetcher;
use crate::matcher::{self, Candidate};
use crate::units;

const BASE_URL: &str = "https://www.amazon.in";

const RESULT_CARD_SELECTORS: &[&str] = &[
    "div[data-component-type='s-search-result']",
    "div.s-result-item[data-asin]",
    "div.s-result-item",
];

const CARD_TITLE_SELECTORS: &[&str] = &["h2 a span", "h2 span", "span.a-text-normal"];

const CARD_LINK_SELECTORS: &[&str] = &[
    "a.a-link-normal.s-no-outline",
    "h2 a.a-link-normal",
    "a.a-link-normal",
];

const MRP_SELECTORS: &[&str] = &[
    "span.a-text-strike",
    "span.a-price.a-text-price span.a-offscreen",
    "#priceblock_strikeprice",
];

const SALE_PRICE_SELECTORS: &[&str] = &[
    "span.a-price-whole",
    "span.a-price span.a-offscreen",
    "#priceblock_ourprice",
];

const TITLE_SELECTORS: &[&str] = &["#productTitle", "span#title"];

pub struct AmazonConnector {
    fetcher: HttpFetcher,
}

impl AmazonConnector {
    pub fn new(request_timeout: Duration, fetch_max_attempts: u32) -> Result<Self> {
        Ok(Self {
            fetcher: HttpFetcher::new(request_timeout, fetch_max_attempts)?,
        })
    }

    fn search_url(name: &str, uom: &str) -> String {
        let query = format!("{} {}", matcher::simplified_query(name), uom.trim());
        let query = query.trim().replace(' ', "+");
        format!("{BASE_URL}/s?k={query}")
    }

    fn collect_candidates(html: &Html) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for selector_str in RESULT_CARD_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for card in html.select(&selector) {
                let fragment = Html::parse_fragment(&card.html());
                let Some(title) = text_from_selectors(&fragment, CARD_TITLE_SELECTORS) else {
                    continue;
                };
                let Some(href) = href_from_selectors(&fragment, CARD_LINK_SELECTORS) else {
                    continue;
                };
                candidates.push(Candidate {
                    display_name: title,
                    url: absolutize(BASE_URL, &href),
                });
            }
            if !candidates.is_empty() {
                break;
            }
        }
        candidates
    }
}

#[async_trait]
impl Connector for AmazonConnector {
    fn platform(&self) -> Platform {
        Platform::Amazon
    }

    async fn search_product(&self, name: &str, uom: &str) -> Result<Option<String>> {
        let search_url = Self::search_url(name, uom);
        debug!("amazon search: {}", search_url);

        // A dead fetch after retries means "platform gave us nothing", which
        // must not abort the SKU.
        let Some(body) = self.fetcher.fetch_html(&search_url).await else {
            return Ok(None);
        };

        let candidates = Self::collect_candidates(&Html::parse_document(&body));
        debug!("amazon returned {} candidates for {:?}", candidates.len(), name);

        let best = matcher::select_best(name, uom, &candidates);
        if let Some(url) = &best {
            info!("amazon match for {:?}: {}", name, url);
        }
        Ok(best)
    }

    async fn extract_details(&self, url: &str) -> Result<Option<ProductDetails>> {
        let Some(body) = self.fetcher.fetch_html(url).await else {
            return Ok(None);
        };
        let html = Html::parse_document(&body);

        let mut details = ProductDetails::new(url.to_string());
        details.mrp = text_from_selectors(&html, MRP_SELECTORS)
            .as_deref()
            .and_then(clean_price);
        details.sale_price = text_from_selectors(&html, SALE_PRICE_SELECTORS)
            .as_deref()
            .and_then(clean_price);

        if let Some(title) = text_from_selectors(&html, TITLE_SELECTORS) {
            if let Some((quantity, uom)) = units::extract_quantity_and_unit(&title) {
                details.quantity = Some(quantity);
                details.uom = Some(uom);
            }
        }

        Ok(Some(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_uses_simplified_query() {
        let url = AmazonConnector::search_url("Parachute 100% Pure Coconut Oil Bottle", "200ml");
        assert_eq!(url, "https://www.amazon.in/s?k=parachute+oil+200ml");
    }

    #[test]
    fn search_url_tolerates_empty_uom() {
        let url = AmazonConnector::search_url("Dove Soap", "");
        assert_eq!(url, "https://www.amazon.in/s?k=dove+soap");
    }

    #[test]
    fn candidates_come_from_result_cards() {
        let html = Html::parse_document(
            r#"
            <div data-component-type="s-search-result">
              <h2><a class="a-link-normal s-no-outline" href="/dp/B0DOVE"><span>Dove Soap 100g</span></a></h2>
            </div>
            <div data-component-type="s-search-result">
              <h2><a class="a-link-normal s-no-outline" href="/dp/B0LUX"><span>Lux Soap 150g</span></a></h2>
            </div>
            "#,
        );
        let candidates = AmazonConnector::collect_candidates(&html);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].display_name, "Dove Soap 100g");
        assert_eq!(candidates[0].url, "https://www.amazon.in/dp/B0DOVE");
    }

    #[test]
    fn cards_without_links_are_skipped() {
        let html = Html::parse_document(
            r#"<div data-component-type="s-search-result"><h2><span>Ad placeholder</span></h2></div>"#,
        );
        assert!(AmazonConnector::collect_candidates(&html).is_empty());
    }
}
