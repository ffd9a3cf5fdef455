//! Stock snapshot CLI
//!
//! Prints quote info and the latest indicator values for one ticker.
//!
//! # Usage
//!
//! ```bash
//! # A-share, six months of history
//! cargo run --bin stock-snapshot -- 600519 --period 6mo
//!
//! # International ticker as JSON, with financial statements
//! cargo run --bin stock-snapshot -- AAPL --json --financials
//! ```

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use stock_data::{FinancialBundle, MarketSnapshot, Period, StockConfig, StockDataService};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-snapshot")]
#[command(about = "Quote info and technical indicators for one ticker", long_about = None)]
struct Args {
    /// Six-digit A-share code or international ticker
    ticker: String,

    /// Lookback period: 1y, 6mo, 3mo or 1mo
    #[arg(short, long, default_value = "1y")]
    period: String,

    /// Also fetch financial statements
    #[arg(short, long)]
    financials: bool,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn quote_table(snapshot: &MarketSnapshot) -> Table {
    let info = &snapshot.info;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);

    table.add_row(vec!["Symbol".to_string(), info.symbol.clone()]);
    table.add_row(vec!["Name".to_string(), info.name.clone()]);
    table.add_row(vec!["Market".to_string(), info.market.to_string()]);
    for (label, value) in [
        ("Price", info.current_price),
        ("Change %", info.change_percent),
        ("P/E", info.pe_ratio),
        ("P/B", info.pb_ratio),
        ("Market cap", info.market_cap),
        ("52w high", info.week_52_high),
        ("52w low", info.week_52_low),
    ] {
        table.add_row(vec![label.to_string(), value.to_string()]);
    }
    if let Some(sector) = &info.sector {
        table.add_row(vec!["Sector".to_string(), sector.clone()]);
    }
    if let Some(industry) = &info.industry {
        table.add_row(vec!["Industry".to_string(), industry.clone()]);
    }
    table
}

fn indicator_table(snapshot: &MarketSnapshot) -> Option<Table> {
    let latest = snapshot.latest.as_ref()?;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Indicator", latest.date.to_string().as_str()]);

    for (name, value) in latest.entries() {
        table.add_row(vec![name.to_string(), value.rounded(4).to_string()]);
    }
    Some(table)
}

fn financials_table(bundle: &FinancialBundle) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Document", "Periods"]);

    let periods =
        |part: Option<usize>| part.map_or_else(|| "unavailable".to_string(), |n| n.to_string());
    table.add_row(vec![
        "Balance sheet".to_string(),
        periods(bundle.balance_sheet.as_ref().map(|t| t.len())),
    ]);
    table.add_row(vec![
        "Income statement".to_string(),
        periods(bundle.income_statement.as_ref().map(|t| t.len())),
    ]);
    table.add_row(vec![
        "Cash flow".to_string(),
        periods(bundle.cash_flow.as_ref().map(|t| t.len())),
    ]);
    table.add_row(vec![
        "Quarterly".to_string(),
        periods(bundle.quarterly.as_ref().map(|t| t.len())),
    ]);
    if let Some(ratios) = &bundle.ratios {
        for (name, value) in &ratios.values {
            table.add_row(vec![name.clone(), value.rounded(4).to_string()]);
        }
    }
    table
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = stock_utils::Config::from_env();
    stock_utils::init_tracing_for(&app);

    let args = Args::parse();
    let period = Period::parse(args.period.trim());

    let config = StockConfig::from_env()?;
    let service = StockDataService::from_config(&config)?;

    info!(ticker = %args.ticker, %period, "Loading snapshot");
    let snapshot = service.load_snapshot(&args.ticker, period).await;
    let financials = if args.financials {
        Some(service.get_financial_data(&args.ticker).await)
    } else {
        None
    };

    if args.json {
        let output = serde_json::json!({
            "snapshot": snapshot,
            "financials": financials,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", quote_table(&snapshot));
    match indicator_table(&snapshot) {
        Some(table) => println!("{table}"),
        None => {
            let reason = snapshot.series_error.as_deref().unwrap_or("no price history");
            eprintln!("Indicators unavailable: {reason}");
        },
    }
    if let Some(bundle) = &financials {
        println!("{}", financials_table(bundle));
    }

    Ok(())
}
