//! Post-run analysis over an assembled result table.
//!
//! Availability is counted off the `{platform}_url` cell being non-empty,
//! which is exactly the absent-platform marker the assembler maintains.
//! Price comparison needs both the base `instamart_sale_price` cell and the
//! platform's `sale_price` cell to parse as numbers; everything else is
//! silently skipped rather than guessed at.

use serde::Serialize;

use crate::connectors::Platform;
use crate::table::{platform_column, SkuTable};

pub const BASE_PRICE_COLUMN: &str = "instamart_sale_price";
pub const CATEGORY_COLUMN: &str = "l1_classification";

const TOP_DEALS: usize = 5;

// ==================== REPORT SHAPES ====================

#[derive(Debug, Serialize)]
pub struct PlatformAvailability {
    pub platform: &'static str,
    pub found: usize,
    pub percent: f64,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityReport {
    pub total_skus: usize,
    pub platforms: Vec<PlatformAvailability>,
}

/// One SKU where the platform undercuts the base price.
#[derive(Debug, Serialize)]
pub struct Deal {
    pub item_name: String,
    pub base_price: f64,
    pub platform_price: f64,
    pub savings: f64,
}

#[derive(Debug, Serialize)]
pub struct PlatformPricing {
    pub platform: &'static str,
    pub compared: usize,
    pub mean_diff: Option<f64>,
    pub best_deals: Vec<Deal>,
}

#[derive(Debug, Serialize)]
pub struct CategoryPricing {
    pub category: String,
    pub platform: &'static str,
    pub compared: usize,
    pub mean_diff: f64,
}

#[derive(Debug, Serialize)]
pub struct PriceReport {
    pub platforms: Vec<PlatformPricing>,
    pub categories: Vec<CategoryPricing>,
}

// ==================== AVAILABILITY ====================

pub fn availability(table: &SkuTable) -> AvailabilityReport {
    let total = table.len();
    let platforms = Platform::ALL
        .iter()
        .map(|&platform| {
            let url_column = platform_column(platform, "url");
            let found = (0..total)
                .filter(|&row| {
                    table
                        .cell(row, &url_column)
                        .is_some_and(|cell| !cell.is_empty())
                })
                .count();
            let percent = if total == 0 {
                0.0
            } else {
                found as f64 * 100.0 / total as f64
            };
            PlatformAvailability {
                platform: platform.as_str(),
                found,
                percent,
            }
        })
        .collect();

    AvailabilityReport {
        total_skus: total,
        platforms,
    }
}

// ==================== PRICING ====================

fn parse_price(cell: Option<&str>) -> Option<f64> {
    let cell = cell?.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok()
}

/// Base price minus platform price for one row; positive means the platform
/// is cheaper. None when either side is missing or unparsable.
fn price_diff(table: &SkuTable, row: usize, platform: Platform) -> Option<f64> {
    let base = parse_price(table.cell(row, BASE_PRICE_COLUMN))?;
    let theirs = parse_price(table.cell(row, &platform_column(platform, "sale_price")))?;
    Some(base - theirs)
}

/// Append a `{platform}_price_diff` column per platform. Rows without a
/// comparable price pair stay empty.
pub fn add_price_diff_columns(table: &mut SkuTable) {
    for platform in Platform::ALL {
        let values: Vec<String> = (0..table.len())
            .map(|row| {
                price_diff(table, row, platform)
                    .map(|diff| format!("{diff:.2}"))
                    .unwrap_or_default()
            })
            .collect();
        table.add_column(&format!("{}_price_diff", platform.as_str()), values);
    }
}

pub fn price_report(table: &SkuTable) -> PriceReport {
    let mut platforms = Vec::new();
    for &platform in &Platform::ALL {
        let mut diffs = Vec::new();
        let mut deals = Vec::new();
        for row in 0..table.len() {
            let Some(diff) = price_diff(table, row, platform) else {
                continue;
            };
            diffs.push(diff);
            if diff > 0.0 {
                let base = parse_price(table.cell(row, BASE_PRICE_COLUMN)).unwrap_or_default();
                deals.push(Deal {
                    item_name: table
                        .cell(row, crate::table::ITEM_NAME_COLUMN)
                        .unwrap_or_default()
                        .to_string(),
                    base_price: base,
                    platform_price: base - diff,
                    savings: diff,
                });
            }
        }
        deals.sort_by(|a, b| b.savings.total_cmp(&a.savings));
        deals.truncate(TOP_DEALS);

        let mean_diff = if diffs.is_empty() {
            None
        } else {
            Some(diffs.iter().sum::<f64>() / diffs.len() as f64)
        };
        platforms.push(PlatformPricing {
            platform: platform.as_str(),
            compared: diffs.len(),
            mean_diff,
            best_deals: deals,
        });
    }

    PriceReport {
        platforms,
        categories: category_pricing(table),
    }
}

fn category_pricing(table: &SkuTable) -> Vec<CategoryPricing> {
    if table.column_index(CATEGORY_COLUMN).is_none() {
        return Vec::new();
    }

    let mut categories = Vec::new();
    for &platform in &Platform::ALL {
        // Keyed accumulation in first-seen order keeps the report stable
        // across runs.
        let mut order: Vec<String> = Vec::new();
        let mut sums: std::collections::HashMap<String, (f64, usize)> =
            std::collections::HashMap::new();
        for row in 0..table.len() {
            let Some(diff) = price_diff(table, row, platform) else {
                continue;
            };
            let category = table
                .cell(row, CATEGORY_COLUMN)
                .unwrap_or_default()
                .trim()
                .to_string();
            if category.is_empty() {
                continue;
            }
            if !sums.contains_key(&category) {
                order.push(category.clone());
            }
            let entry = sums.entry(category).or_insert((0.0, 0));
            entry.0 += diff;
            entry.1 += 1;
        }
        for category in order {
            let (sum, count) = sums[&category];
            categories.push(CategoryPricing {
                category,
                platform: platform.as_str(),
                compared: count,
                mean_diff: sum / count as f64,
            });
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn table_from(content: &str) -> SkuTable {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        SkuTable::load(file.path(), None).unwrap()
    }

    fn populated_table() -> SkuTable {
        let mut table = table_from(
            "Item Name,UOM,instamart_sale_price,l1_classification\n\
             Parachute Coconut Oil,200ml,100,Personal Care\n\
             Dove Soap,100g,60,Personal Care\n\
             Maggi Noodles,280g,56,Packaged Food\n",
        );
        table.add_column(
            "amazon_url",
            vec![
                "https://www.amazon.in/dp/A".to_string(),
                "https://www.amazon.in/dp/B".to_string(),
                String::new(),
            ],
        );
        table.add_column(
            "amazon_sale_price",
            vec!["90".to_string(), "65".to_string(), String::new()],
        );
        table.add_column(
            "zepto_url",
            vec!["https://www.zeptonow.com/pn/A".to_string(), String::new(), String::new()],
        );
        table.add_column(
            "zepto_sale_price",
            vec!["N/A".to_string(), String::new(), String::new()],
        );
        table
    }

    #[test]
    fn availability_counts_non_empty_url_cells() {
        let report = availability(&populated_table());
        assert_eq!(report.total_skus, 3);
        let amazon = &report.platforms[0];
        assert_eq!(amazon.platform, "amazon");
        assert_eq!(amazon.found, 2);
        assert!((amazon.percent - 66.666).abs() < 0.01);
        let zepto = &report.platforms[2];
        assert_eq!(zepto.found, 1);
    }

    #[test]
    fn price_diffs_need_both_sides_parsable() {
        let table = populated_table();
        assert_eq!(price_diff(&table, 0, Platform::Amazon), Some(10.0));
        assert_eq!(price_diff(&table, 1, Platform::Amazon), Some(-5.0));
        // "N/A" sale price never produces a diff.
        assert_eq!(price_diff(&table, 0, Platform::Zepto), None);
        assert_eq!(price_diff(&table, 2, Platform::Amazon), None);
    }

    #[test]
    fn diff_columns_are_appended_per_platform() {
        let mut table = populated_table();
        add_price_diff_columns(&mut table);
        assert_eq!(table.cell(0, "amazon_price_diff"), Some("10.00"));
        assert_eq!(table.cell(1, "amazon_price_diff"), Some("-5.00"));
        assert_eq!(table.cell(2, "amazon_price_diff"), Some(""));
        assert_eq!(table.cell(0, "zepto_price_diff"), Some(""));
    }

    #[test]
    fn report_ranks_deals_by_savings() {
        let report = price_report(&populated_table());
        let amazon = &report.platforms[0];
        assert_eq!(amazon.compared, 2);
        assert!((amazon.mean_diff.unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(amazon.best_deals.len(), 1);
        assert_eq!(amazon.best_deals[0].item_name, "Parachute Coconut Oil");
        assert!((amazon.best_deals[0].savings - 10.0).abs() < 1e-9);
    }

    #[test]
    fn category_means_group_by_classification() {
        let report = price_report(&populated_table());
        let personal_care: Vec<_> = report
            .categories
            .iter()
            .filter(|c| c.platform == "amazon")
            .collect();
        assert_eq!(personal_care.len(), 1);
        assert_eq!(personal_care[0].category, "Personal Care");
        assert_eq!(personal_care[0].compared, 2);
        assert!((personal_care[0].mean_diff - 2.5).abs() < 1e-9);
    }

    #[test]
    fn empty_table_yields_zeroed_report() {
        let table = table_from("Item Name,UOM\n");
        let report = availability(&table);
        assert_eq!(report.total_skus, 0);
        assert!(report.platforms.iter().all(|p| p.percent == 0.0));
        assert!(price_report(&table).platforms.iter().all(|p| p.mean_diff.is_none()));
    }
}
