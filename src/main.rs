use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shelfmatch::{analyzer, pipeline, MatcherConfig, SkuTable};

/// Resolve Instamart SKUs against Amazon, Blinkit, and Zepto and write the
/// matched listings back into the table.
#[derive(Parser, Debug)]
#[command(name = "shelfmatch", version, about)]
struct Args {
    /// Input CSV with at least "Item Name" and "UOM" columns.
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long, default_value = "matched.csv")]
    output: PathBuf,

    /// Process only the first N rows.
    #[arg(long)]
    limit: Option<usize>,

    /// Override the concurrent worker cap.
    #[arg(long)]
    workers: Option<usize>,

    /// Override the WebDriver endpoint for the browser-driven platforms.
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Print the price comparison report after the run.
    #[arg(long)]
    prices: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = MatcherConfig::from_env();
    config.row_limit = args.limit.or(config.row_limit);
    if let Some(workers) = args.workers {
        config.max_workers = workers.max(1);
    }
    if let Some(url) = args.webdriver_url {
        config.webdriver_url = url;
    }

    let mut table = SkuTable::load(&args.input, config.row_limit)?;
    if table.is_empty() {
        info!("input has no data rows, writing headers only");
        table.save(&args.output)?;
        return Ok(());
    }

    let connectors = pipeline::default_connectors(&config)?;
    let outcomes = pipeline::run_batch(&config, connectors, table.sku_inputs()).await;
    for outcome in &outcomes {
        table.apply_result(outcome.index, &outcome.result);
    }

    analyzer::add_price_diff_columns(&mut table);
    table.save(&args.output)?;

    let availability = analyzer::availability(&table);
    println!("{}", serde_json::to_string_pretty(&availability)?);
    if args.prices {
        let prices = analyzer::price_report(&table);
        println!("{}", serde_json::to_string_pretty(&prices)?);
    }

    Ok(())
}
