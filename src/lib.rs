//! Multi-platform product resolution pipeline.
//!
//! Takes a CSV of Instamart SKUs and resolves each one against Amazon,
//! Blinkit, and Zepto: search the platform, score the returned candidates
//! against the SKU name and pack size, then extract price and quantity
//! fields from the chosen listing. Results land back in the table as
//! per-platform columns, ready for availability and price-gap analysis.

pub mod analyzer;
pub mod browser;
pub mod config;
pub mod connectors;
pub mod error;
pub mod fetch;
pub mod matcher;
pub mod pipeline;
pub mod retry;
pub mod table;
pub mod units;

pub use config::MatcherConfig;
pub use connectors::{Connector, Platform, ProductDetails};
pub use error::InputError;
pub use pipeline::{run_batch, SkuInput, SkuOutcome, SkuResult};
pub use table::SkuTable;
