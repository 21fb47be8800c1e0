//! Coins.xyz REST ticker client

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::oracle::sources::{get_json, quote_from_ticker, SourceAdapter};
use crate::types::Quote;

const SOURCE: &str = "coins";
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct CoinsSource {
    client: Client,
    base_url: String,
    symbol: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CoinsSource {
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
        format!("{}/v1/ticker/{}", self.base_url, self.symbol)
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
}

#[async_trait]
impl SourceAdapter for CoinsSource {
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
        if self.api_key.is_none() {
            debug!(source = SOURCE, pair = %self.symbol, "No API key, querying unauthenticated");
        }
        let payload =
            get_json(&self.client, SOURCE, &self.url(), self.headers(), self.timeout).await?;
        quote_from_ticker(SOURCE, &self.symbol, &payload)
    }
}
