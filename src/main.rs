use gdax_orderbook::config::{Credentials, OrderBookConfig};
use gdax_orderbook::gdax::Side;
use gdax_orderbook::orderbook::OrderBookEngine;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = parse_args(&args);

    match Credentials::from_env() {
        Ok(Some(credentials)) => {
            info!(api_key = %credentials.api_key, "running authenticated");
            config = config.with_credentials(credentials);
        }
        Ok(None) => info!("running unauthenticated"),
        Err(message) => anyhow::bail!(message),
    }

    let mut engine = OrderBookEngine::start(config).await?;
    info!("order book engine started");

    tokio::select! {
        result = watch_books(&mut engine) => result?,
        _ = tokio::signal::ctrl_c() => info!("interrupted, shutting down"),
    }

    engine.shutdown().await?;
    Ok(())
}

/// Applies the feed forever, logging the top of each touched book.
async fn watch_books(engine: &mut OrderBookEngine) -> gdax_orderbook::Result<()> {
    loop {
        let Some(message) = engine.next_message().await? else {
            // a recovery just replaced the books
            continue;
        };
        let Some(product_id) = message.product_id() else {
            continue;
        };
        if let Some(book) = engine.book(product_id) {
            info!(
                product_id = %product_id,
                sequence = book.sequence().unwrap_or(0),
                best_bid = %fmt_price(book.best_bid_price()),
                best_ask = %fmt_price(book.best_ask_price()),
                bid_depth = %fmt_price(book.total_size_at_best(Side::Buy)),
                ask_depth = %fmt_price(book.total_size_at_best(Side::Sell)),
                "book updated"
            );
        }
    }
}

fn fmt_price(price: Option<rust_decimal::Decimal>) -> String {
    price.map_or_else(|| "-".to_string(), |p| p.to_string())
}

/// Parse command-line arguments
fn parse_args(args: &[String]) -> OrderBookConfig {
    let mut product_ids: Vec<String> = Vec::new();
    let mut heartbeat = false;
    let mut trade_log: Option<String> = None;
    let mut timeout_secs: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--heartbeat" => heartbeat = true,
            "--trade-log" => {
                if i + 1 < args.len() {
                    trade_log = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--timeout" => {
                if i + 1 < args.len() {
                    timeout_secs = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
            product_id => product_ids.push(product_id.to_string()),
        }
        i += 1;
    }

    if product_ids.is_empty() {
        product_ids = vec!["ETH-USD".to_string(), "BTC-USD".to_string()];
    }

    let mut config = OrderBookConfig::new(product_ids).with_heartbeat(heartbeat);
    if let Some(path) = trade_log {
        config = config.with_trade_log(path);
    }
    if let Some(secs) = timeout_secs {
        config = config.with_timeout_secs(secs);
    }
    config
}

fn print_usage() {
    eprintln!(
        "Usage: gdax-book [PRODUCT_ID...] [OPTIONS]

Maintains live level-3 order books for the given products
(default: ETH-USD BTC-USD).

Options:
  --heartbeat           Ask the feed for heartbeat frames
  --trade-log <PATH>    Append snapshots and raw frames to PATH
  --timeout <SECS>      REST snapshot timeout (default: 10)
  -h, --help            Show this help

Credentials (optional) are read from GDAX_API_KEY, GDAX_API_SECRET,
and GDAX_PASSPHRASE."
    );
}
