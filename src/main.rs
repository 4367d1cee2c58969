use anyhow::Context;
use chrono::{TimeZone, Utc};
use lbankx::core::config::ExchangeConfig;
use lbankx::core::traits::MarketDataSource;
use lbankx::exchanges::lbank::build_connector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let pair = std::env::args().nth(1).unwrap_or_else(|| "BTC/USDT".to_string());

    // Market data only; credentials are not needed here
    let config = ExchangeConfig::from_env("LBANK")
        .unwrap_or_else(|_| ExchangeConfig::read_only())
        .public_only(true);
    let lbank = build_connector(config).context("failed to build LBank connector")?;

    println!("Fetching markets...");
    let markets = lbank
        .load_markets()
        .await
        .context("failed to load LBank markets")?;
    println!("Found {} markets", markets.len());

    match lbank.market_info(&pair).await {
        Some(info) => println!(
            "Market: {} ({}), base decimals: {}, quote decimals: {}",
            info.pair.readable, info.pair.plain, info.base_decimals, info.quote_decimals
        ),
        None => println!("No market info for {}", pair),
    }

    if let Some(rates) = lbank.get_rates(&pair).await {
        println!(
            "{}: bid {} / ask {}, last {}, 24h volume {}",
            pair, rates.bid, rates.ask, rates.last, rates.volume
        );
    }

    if let Some(trades) = lbank.get_trades_history(&pair, Some(5)).await {
        for trade in trades {
            let time = Utc
                .timestamp_millis_opt(trade.date)
                .single()
                .map_or_else(|| trade.date.to_string(), |t| t.to_rfc3339());
            println!(
                "{} {} {} @ {}",
                time, trade.side, trade.base_amount, trade.price
            );
        }
    }

    Ok(())
}
