//! Binance spot REST client for book ticker quotes
//!
//! Uses `/api/v3/ticker/bookTicker`. The API key header is optional: without
//! it the public endpoint is queried unauthenticated.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::error::FetchError;
use crate::oracle::sources::{get_json, validate_book, SourceAdapter};
use crate::types::Quote;

const SOURCE: &str = "binance";
const BOOK_TICKER_PATH: &str = "/api/v3/ticker/bookTicker";
const API_KEY_HEADER: &str = "x-mbx-apikey";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicker {
    bid_price: Option<String>,
    ask_price: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BinanceSource {
    client: Client,
    base_url: String,
    symbol: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl BinanceSource {
    pub fn new(
        client: Client,
        base_url: &str,
        symbol: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol: symbol.to_uppercase(),
            api_key,
            timeout,
        }
    }

    fn url(&self) -> String {
        format!("{}{}?symbol={}", self.base_url, BOOK_TICKER_PATH, self.symbol)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            match HeaderValue::from_str(key) {
                Ok(value) => {
                    headers.insert(API_KEY_HEADER, value);
                }
                Err(_) => {
                    warn!(
                        source = SOURCE,
                        "API key is not a valid header value, sending unauthenticated"
                    );
                }
            }
        }
        headers
    }

    fn parse(&self, payload: serde_json::Value) -> Result<Quote, FetchError> {
        let ticker: BookTicker = serde_json::from_value(payload)
            .map_err(|e| FetchError::rejected(SOURCE, format!("unexpected payload: {}", e)))?;

        let bid = parse_field(ticker.bid_price, "bidPrice")?;
        let ask = parse_field(ticker.ask_price, "askPrice")?;
        validate_book(SOURCE, bid, ask)?;

        Ok(Quote::observed_now(&self.symbol, bid, ask, SOURCE, false))
    }
}

fn parse_field(value: Option<String>, field: &str) -> Result<f64, FetchError> {
    let raw =
        value.ok_or_else(|| FetchError::rejected(SOURCE, format!("missing field '{}'", field)))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| {
            FetchError::rejected(SOURCE, format!("field '{}' is not numeric: {}", field, raw))
        })
}

#[async_trait]
impl SourceAdapter for BinanceSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn pair(&self) -> &str {
        &self.symbol
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self) -> Result<Quote, FetchError> {
        let payload =
            get_json(&self.client, SOURCE, &self.url(), self.headers(), self.timeout).await?;
        self.parse(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(api_key: Option<&str>) -> BinanceSource {
        BinanceSource::new(
            Client::new(),
            "https://api.binance.com/",
            "gbpusdt",
            api_key.map(String::from),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_url_uses_upper_symbol() {
        assert_eq!(
            source(None).url(),
            "https://api.binance.com/api/v3/ticker/bookTicker?symbol=GBPUSDT"
        );
    }

    #[test]
    fn test_key_header_is_optional() {
        assert!(source(None).headers().is_empty());
        let headers = source(Some("k")).headers();
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "k");
    }

    #[test]
    fn test_invalid_key_is_not_sent() {
        assert!(source(Some("bad\nkey")).headers().is_empty());
    }

    #[test]
    fn test_parse_book_ticker() {
        let quote = source(None)
            .parse(json!({
                "symbol": "GBPUSDT",
                "bidPrice": "1.27450000",
                "bidQty": "100.0",
                "askPrice": "1.27550000",
                "askQty": "80.0"
            }))
            .unwrap();
        assert_eq!(quote.pair(), "GBPUSDT");
        assert_eq!(quote.bid(), 1.2745);
        assert_eq!(quote.ask(), 1.2755);
        assert_eq!(quote.source(), "binance");
        assert!(!quote.is_fallback());
    }

    #[test]
    fn test_parse_rejects_missing_ask() {
        let err = source(None)
            .parse(json!({"bidPrice": "1.2745"}))
            .unwrap_err();
        assert!(matches!(err, FetchError::UpstreamRejection { .. }));
    }

    #[test]
    fn test_parse_rejects_zero_bid() {
        let err = source(None)
            .parse(json!({"bidPrice": "0.00000000", "askPrice": "1.2755"}))
            .unwrap_err();
        assert!(matches!(err, FetchError::UpstreamRejection { .. }));
    }
}
