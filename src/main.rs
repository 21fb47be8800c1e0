//! Resolve every tracked pair once and log the normalized quotes
//!
//! Usage: cargo run --bin fx-oracle
//!
//! Credentials are read from the environment (or `.env`); see `config`.
//! Set `LOG_FORMAT=json` for structured log lines.

use anyhow::{Context, Result};
use fx_oracle::config::AppConfig;
use fx_oracle::PriceOracle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::load()?;
    info!(config = %config, "🚀 Starting FX oracle");

    let oracle = PriceOracle::from_config(&config).context("Failed to build price oracle")?;

    for (provider, configured) in oracle.provider_status() {
        if !configured {
            warn!(provider = %provider, "Provider credentials missing, running degraded");
        }
    }

    let records = oracle.get_all_prices().await;
    for pair in &config.oracle.tracked_pairs {
        match records.get(&pair.to_uppercase()) {
            Some(r) => info!(
                pair = %r.pair,
                bid = r.bid,
                ask = r.ask,
                mid = r.mid,
                spread_bps = r.spread_bps,
                source = %r.source,
                staleness_s = r.staleness_seconds,
                fallback = r.is_fallback,
                "Quote"
            ),
            None => warn!(pair = %pair, "No quote available"),
        }
    }

    info!(resolved = records.len(), tracked = config.oracle.tracked_pairs.len(), "✅ Done");
    Ok(())
}
