//! Batch behavior against scripted in-process connectors: per-platform
//! isolation, per-SKU failure containment, and table assembly.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use shelfmatch::{
    pipeline, Connector, MatcherConfig, Platform, ProductDetails, SkuInput, SkuTable,
};

#[derive(Clone)]
enum Script {
    Found(ProductDetails),
    NotFound,
    SearchError,
    Panics,
}

/// Connector whose behavior is scripted per item name; unknown names get
/// NotFound.
struct ScriptedConnector {
    platform: Platform,
    scripts: HashMap<String, Script>,
}

impl ScriptedConnector {
    fn new(platform: Platform, scripts: &[(&str, Script)]) -> Arc<dyn Connector> {
        Arc::new(Self {
            platform,
            scripts: scripts
                .iter()
                .map(|(name, s)| (name.to_string(), s.clone()))
                .collect(),
        })
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn search_product(&self, name: &str, _uom: &str) -> Result<Option<String>> {
        match self.scripts.get(name) {
            Some(Script::Found(details)) => Ok(Some(details.url.clone())),
            Some(Script::NotFound) | None => Ok(None),
            Some(Script::SearchError) => Err(anyhow!("connection reset")),
            Some(Script::Panics) => panic!("scripted panic"),
        }
    }

    async fn extract_details(&self, url: &str) -> Result<Option<ProductDetails>> {
        for script in self.scripts.values() {
            if let Script::Found(details) = script {
                if details.url == url {
                    return Ok(Some(details.clone()));
                }
            }
        }
        Ok(None)
    }
}

fn details(url: &str, sale_price: Option<&str>) -> ProductDetails {
    let mut d = ProductDetails::new(url.to_string());
    d.sale_price = sale_price.map(str::to_string);
    d
}

fn fast_config() -> MatcherConfig {
    MatcherConfig {
        max_workers: 4,
        min_submit_delay: Duration::from_millis(0),
        max_submit_delay: Duration::from_millis(1),
        sku_max_retries: 2,
        sku_retry_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

fn sku(index: usize, name: &str) -> SkuInput {
    SkuInput {
        index,
        item_name: name.to_string(),
        uom: "100g".to_string(),
    }
}

#[tokio::test]
async fn platform_failures_stay_isolated() {
    let connectors = vec![
        ScriptedConnector::new(
            Platform::Amazon,
            &[("Dove Soap", Script::Found(details("https://a/dove", Some("55"))))],
        ),
        ScriptedConnector::new(Platform::Blinkit, &[("Dove Soap", Script::SearchError)]),
        ScriptedConnector::new(Platform::Zepto, &[("Dove Soap", Script::NotFound)]),
    ];

    let result = pipeline::resolve_sku(&connectors, &sku(0, "Dove Soap")).await;

    let amazon = result[&Platform::Amazon].as_ref().unwrap();
    assert_eq!(amazon.url, "https://a/dove");
    assert_eq!(amazon.sale_price.as_deref(), Some("55"));
    // An erroring platform and a no-match platform both read as absent.
    assert!(result[&Platform::Blinkit].is_none());
    assert!(result[&Platform::Zepto].is_none());
}

#[tokio::test]
async fn batch_yields_one_outcome_per_input_in_order() {
    let connectors = vec![
        ScriptedConnector::new(
            Platform::Amazon,
            &[
                ("Item A", Script::Found(details("https://a/a", None))),
                ("Item C", Script::Found(details("https://a/c", None))),
            ],
        ),
        ScriptedConnector::new(Platform::Blinkit, &[]),
        ScriptedConnector::new(Platform::Zepto, &[]),
    ];
    let skus = vec![sku(0, "Item A"), sku(1, "Item B"), sku(2, "Item C")];

    let outcomes = pipeline::run_batch(&fast_config(), connectors, skus).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(outcomes[0].result[&Platform::Amazon].is_some());
    assert!(outcomes[1].result[&Platform::Amazon].is_none());
    assert!(outcomes[2].result[&Platform::Amazon].is_some());
    assert!(outcomes.iter().all(|o| !o.failed));
}

#[tokio::test]
async fn panicking_sku_does_not_poison_the_batch() {
    let connectors = vec![
        ScriptedConnector::new(
            Platform::Amazon,
            &[
                ("Good Item", Script::Found(details("https://a/good", None))),
                ("Bad Item", Script::Panics),
            ],
        ),
        ScriptedConnector::new(Platform::Blinkit, &[]),
        ScriptedConnector::new(Platform::Zepto, &[]),
    ];
    let skus = vec![sku(0, "Good Item"), sku(1, "Bad Item"), sku(2, "Other Item")];

    let outcomes = pipeline::run_batch(&fast_config(), connectors, skus).await;

    assert_eq!(outcomes.len(), 3);
    assert!(!outcomes[0].failed);
    assert!(outcomes[0].result[&Platform::Amazon].is_some());
    // The bad SKU exhausts its retries, lands all-absent, and is flagged.
    assert!(outcomes[1].failed);
    assert!(Platform::ALL.iter().all(|p| outcomes[1].result[p].is_none()));
    assert!(!outcomes[2].failed);
}

#[tokio::test]
async fn outcomes_carry_their_input_row_indices() {
    let connectors = vec![
        ScriptedConnector::new(
            Platform::Amazon,
            &[("Bad Item", Script::Panics)],
        ),
        ScriptedConnector::new(Platform::Blinkit, &[]),
        ScriptedConnector::new(Platform::Zepto, &[]),
    ];
    // Row indices are identities, not positions: a limited or filtered load
    // can hand the scheduler a sparse set.
    let skus = vec![sku(7, "Item A"), sku(2, "Bad Item"), sku(11, "Item C")];

    let outcomes = pipeline::run_batch(&fast_config(), connectors, skus).await;

    assert_eq!(
        outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
        vec![2, 7, 11]
    );
    // Even the exhausted-retries row keeps its real index so it stays
    // attributable to its input row.
    let failed: Vec<_> = outcomes.iter().filter(|o| o.failed).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 2);
}

#[tokio::test]
async fn batch_results_assemble_into_the_table() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        b"Item Name,UOM,instamart_sale_price\n\
          Dove Soap,100g,60\n\
          Unknown Thing,1pcs,10\n",
    )
    .unwrap();
    file.flush().unwrap();
    let mut table = SkuTable::load(file.path(), None).unwrap();

    let connectors = vec![
        ScriptedConnector::new(
            Platform::Amazon,
            &[("Dove Soap", Script::Found(details("https://a/dove", Some("55"))))],
        ),
        ScriptedConnector::new(Platform::Blinkit, &[]),
        ScriptedConnector::new(Platform::Zepto, &[]),
    ];

    let outcomes = pipeline::run_batch(&fast_config(), connectors, table.sku_inputs()).await;
    for outcome in &outcomes {
        table.apply_result(outcome.index, &outcome.result);
    }

    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(0, "amazon_url"), Some("https://a/dove"));
    assert_eq!(table.cell(0, "amazon_sale_price"), Some("55"));
    assert_eq!(table.cell(0, "amazon_mrp"), Some("N/A"));
    assert_eq!(table.cell(0, "blinkit_url"), Some(""));
    assert_eq!(table.cell(1, "amazon_url"), Some(""));
    assert_eq!(table.cell(1, "zepto_uom"), Some(""));
}
