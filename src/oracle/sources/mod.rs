//! Price source adapters (Binance, Coins.xyz, Valor PRO, Simulated)
//!
//! Each adapter is bound to one (provider, pair) combination and performs at
//! most one outbound request per fetch.

mod binance;
mod coins;
mod simulated;
mod valorpro;

pub use binance::BinanceSource;
pub use coins::CoinsSource;
pub use simulated::SimulatedSource;
pub use valorpro::{sign_request, ValorProSource};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;
use crate::types::{epoch_to_rfc3339, utc_now_rfc3339, Quote};

/// Trait for price source adapters
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Provenance tag stamped on produced quotes
    fn name(&self) -> &'static str;

    /// The single pair this adapter serves
    fn pair(&self) -> &str;

    /// Whether the provider credentials are present
    fn is_configured(&self) -> bool {
        true
    }

    /// Fetch one ticker and normalize it
    async fn fetch(&self) -> Result<Quote, FetchError>;
}

/// GET a JSON document, mapping every failure to a typed `FetchError`
pub(crate) async fn get_json(
    client: &Client,
    source: &'static str,
    url: &str,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<Value, FetchError> {
    let response = client
        .get(url)
        .headers(headers)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::transport(source, describe_transport(&e, timeout)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::rejected(
            source,
            format!("HTTP {}: {}", status, truncate(&body, 200)),
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::transport(source, describe_transport(&e, timeout)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| FetchError::rejected(source, format!("malformed payload: {}", e)))
}

fn describe_transport(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("timed out after {}s", timeout.as_secs_f64())
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Read a price field that may be a JSON number or a numeric string
pub(crate) fn parse_price(
    source: &'static str,
    payload: &Value,
    field: &str,
) -> Result<f64, FetchError> {
    let price = match payload.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Null) | None => {
            return Err(FetchError::rejected(source, format!("missing field '{}'", field)))
        }
        Some(_) => None,
    };
    price.ok_or_else(|| FetchError::rejected(source, format!("field '{}' is not numeric", field)))
}

/// Reject non-positive, non-finite and crossed books
pub(crate) fn validate_book(source: &'static str, bid: f64, ask: f64) -> Result<(), FetchError> {
    if !bid.is_finite() || !ask.is_finite() || bid <= 0.0 || ask <= 0.0 {
        return Err(FetchError::rejected(
            source,
            format!("invalid book bid={} ask={}", bid, ask),
        ));
    }
    if ask < bid {
        return Err(FetchError::rejected(
            source,
            format!("crossed book bid={} > ask={}", bid, ask),
        ));
    }
    Ok(())
}

/// Upstream timestamp as RFC 3339 UTC. RFC 3339 strings are re-rendered in
/// UTC, epochs (numeric or numeric strings) are converted, anything else means
/// "observed now"
pub(crate) fn upstream_timestamp(payload: &Value) -> String {
    match payload.get("timestamp") {
        Some(Value::String(s)) => normalize_timestamp_str(s.trim()),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(epoch_to_rfc3339)
            .unwrap_or_else(utc_now_rfc3339),
        _ => utc_now_rfc3339(),
    }
}

fn normalize_timestamp_str(raw: &str) -> String {
    if let Ok(epoch) = raw.parse::<i64>() {
        return epoch_to_rfc3339(epoch).unwrap_or_else(utc_now_rfc3339);
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        Err(_) => {
            debug!(timestamp = %raw, "Unrecognized upstream timestamp, using now");
            utc_now_rfc3339()
        }
    }
}

/// Build a quote from a `{bid, ask, timestamp?}` ticker payload
pub(crate) fn quote_from_ticker(
    source: &'static str,
    pair: &str,
    payload: &Value,
) -> Result<Quote, FetchError> {
    let bid = parse_price(source, payload, "bid")?;
    let ask = parse_price(source, payload, "ask")?;
    validate_book(source, bid, ask)?;
    Ok(Quote::new(
        pair,
        bid,
        ask,
        source,
        upstream_timestamp(payload),
        false,
    ))
}
