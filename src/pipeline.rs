//! Per-SKU resolution and batch scheduling.
//!
//! One SKU resolves against every platform independently: a platform that
//! errors or finds nothing is recorded as absent without touching the
//! others. The whole per-SKU routine runs inside a failure boundary that is
//! retried a bounded number of times, and the batch layer fans SKUs out over
//! a bounded pool with jittered pacing between submissions. Nothing short of
//! a bad input file aborts a batch: every input row produces exactly one
//! outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::MatcherConfig;
use crate::connectors::{
    AmazonConnector, BlinkitConnector, Connector, Platform, ProductDetails, ZeptoConnector,
};

// ==================== TYPES ====================

/// One row of work: the SKU name/uom plus its input row index, which is also
/// its identity in the output table.
#[derive(Debug, Clone)]
pub struct SkuInput {
    pub index: usize,
    pub item_name: String,
    pub uom: String,
}

/// Per-platform resolution for one SKU. `None` means no match was found or
/// the platform was unreachable; a present record may still have individual
/// fields missing.
pub type SkuResult = HashMap<Platform, Option<ProductDetails>>;

fn all_absent() -> SkuResult {
    Platform::ALL.iter().map(|p| (*p, None)).collect()
}

/// Terminal outcome of one SKU task. `failed` marks a SKU whose routine kept
/// panicking past the retry budget; its result is all-absent but the row is
/// still present in the output.
#[derive(Debug)]
pub struct SkuOutcome {
    pub index: usize,
    pub result: SkuResult,
    pub failed: bool,
}

/// The production connector set, one per platform, in fixed order.
pub fn default_connectors(config: &MatcherConfig) -> Result<Vec<Arc<dyn Connector>>> {
    Ok(vec![
        Arc::new(AmazonConnector::new(
            config.request_timeout,
            config.fetch_max_attempts,
        )?),
        Arc::new(BlinkitConnector::new(
            config.webdriver_url.clone(),
            config.element_wait,
        )),
        Arc::new(ZeptoConnector::new(
            config.webdriver_url.clone(),
            config.element_wait,
        )),
    ])
}

// ==================== ORCHESTRATOR ====================

/// Resolve one SKU against every platform. Failures are contained per
/// platform; the function itself never fails.
pub async fn resolve_sku(connectors: &[Arc<dyn Connector>], sku: &SkuInput) -> SkuResult {
    let mut result = all_absent();

    for connector in connectors {
        let platform = connector.platform();
        let record = resolve_on_platform(connector.as_ref(), sku).await;
        match &record {
            Some(details) => info!(
                "sku {} matched on {}: {}",
                sku.index,
                platform.as_str(),
                details.url
            ),
            None => info!("sku {} not found on {}", sku.index, platform.as_str()),
        }
        result.insert(platform, record);
    }

    result
}

async fn resolve_on_platform(connector: &dyn Connector, sku: &SkuInput) -> Option<ProductDetails> {
    let platform = connector.platform();

    let url = match connector.search_product(&sku.item_name, &sku.uom).await {
        Ok(Some(url)) => url,
        Ok(None) => return None,
        Err(e) => {
            error!(
                "sku {} search failed on {}: {:#}",
                sku.index,
                platform.as_str(),
                e
            );
            return None;
        }
    };

    match connector.extract_details(&url).await {
        Ok(record) => record,
        Err(e) => {
            error!(
                "sku {} extraction failed on {}: {:#}",
                sku.index,
                platform.as_str(),
                e
            );
            None
        }
    }
}

/// Run the per-SKU routine inside a failure boundary, retrying panicked
/// attempts. Exhaustion yields an all-absent outcome marked failed.
pub async fn resolve_sku_with_retry(
    connectors: Arc<Vec<Arc<dyn Connector>>>,
    sku: SkuInput,
    max_retries: u32,
    retry_delay: Duration,
) -> SkuOutcome {
    let attempts = max_retries.max(1);
    for attempt in 1..=attempts {
        let connectors = connectors.clone();
        let sku_clone = sku.clone();
        let handle =
            tokio::spawn(async move { resolve_sku(&connectors, &sku_clone).await });

        match handle.await {
            Ok(result) => {
                return SkuOutcome {
                    index: sku.index,
                    result,
                    failed: false,
                }
            }
            Err(e) => {
                warn!(
                    "sku {} attempt {}/{} aborted: {}",
                    sku.index, attempt, attempts, e
                );
                if attempt < attempts {
                    sleep(retry_delay).await;
                }
            }
        }
    }

    error!("sku {} failed after {} attempts", sku.index, attempts);
    SkuOutcome {
        index: sku.index,
        result: all_absent(),
        failed: true,
    }
}

// ==================== SCHEDULER ====================

/// Fan the SKU list out over a bounded worker pool with jittered pacing
/// between submissions. Always returns one outcome per input, ordered by
/// input index.
pub async fn run_batch(
    config: &MatcherConfig,
    connectors: Vec<Arc<dyn Connector>>,
    skus: Vec<SkuInput>,
) -> Vec<SkuOutcome> {
    let total = skus.len();
    info!(
        "starting batch: {} SKUs, {} workers",
        total, config.max_workers
    );

    let connectors = Arc::new(connectors);
    let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));
    let mut handles = Vec::with_capacity(total);

    let last = skus.len().saturating_sub(1);
    for (position, sku) in skus.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let connectors = connectors.clone();
        let max_retries = config.sku_max_retries;
        let retry_delay = config.sku_retry_delay;
        let index = sku.index;

        debug!("sku {} queued", index);
        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("sku {} never scheduled: semaphore closed", index);
                    return SkuOutcome {
                        index,
                        result: all_absent(),
                        failed: true,
                    };
                }
            };
            debug!("sku {} running", index);
            resolve_sku_with_retry(connectors, sku, max_retries, retry_delay).await
        });
        handles.push((index, handle));

        // Pacing applies between submissions, not completions; bursty
        // submission patterns are what trip rate limiting.
        if position < last {
            sleep(config.submit_delay()).await;
        }
    }

    let mut outcomes = Vec::with_capacity(total);
    for (index, handle) in handles {
        match handle.await {
            Ok(outcome) => {
                if outcome.failed {
                    warn!("sku {} completed as failed (all platforms absent)", outcome.index);
                } else {
                    debug!("sku {} completed", outcome.index);
                }
                outcomes.push(outcome);
            }
            Err(e) => {
                // The retry boundary already absorbs panics; this is the
                // last-resort conversion so the batch still yields a row
                // attributable to its input.
                error!("sku {} task join failed: {}", index, e);
                outcomes.push(SkuOutcome {
                    index,
                    result: all_absent(),
                    failed: true,
                });
            }
        }
    }

    outcomes.sort_by_key(|o| o.index);
    let failed = outcomes.iter().filter(|o| o.failed).count();
    info!("batch finished: {} SKUs, {} failed", total, failed);
    outcomes
}
