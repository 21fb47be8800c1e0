//! Valor PRO REST ticker client
//!
//! Every request is signed: `X-Signature` is the hex HMAC-SHA256 of
//! `path + timestamp_ms` keyed by the client secret. Signatures are built per
//! call and never reused.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use sha2::Sha256;
use std::time::Duration;

use crate::error::FetchError;
use crate::oracle::sources::{get_json, quote_from_ticker, SourceAdapter};
use crate::types::Quote;

const SOURCE: &str = "valorpro";

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 signature over `path + timestamp_ms`
pub fn sign_request(secret: &str, path: &str, timestamp_ms: i64) -> Result<String, FetchError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
        FetchError::SignatureConfig {
            source_name: SOURCE.to_string(),
            message: format!("failed to initialize HMAC: {}", e),
        }
    })?;
    mac.update(path.as_bytes());
    mac.update(timestamp_ms.to_string().as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Clone)]
pub struct ValorProSource {
    client: Client,
    base_url: String,
    symbol: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    timeout: Duration,
}

impl ValorProSource {
    pub fn new(
        client: Client,
        base_url: &str,
        symbol: &str,
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol: symbol.to_uppercase(),
            client_id,
            client_secret,
            timeout,
        }
    }

    fn path(&self) -> String {
        format!("/v1/ticker/{}", self.symbol)
    }

    fn signed_headers(&self, timestamp_ms: i64) -> Result<HeaderMap, FetchError> {
        let secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| FetchError::SignatureConfig {
                source_name: SOURCE.to_string(),
                message: "VALORPRO_CLIENT_SECRET not configured".to_string(),
            })?;
        let signature = sign_request(secret, &self.path(), timestamp_ms)?;

        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|_| FetchError::SignatureConfig {
                source_name: SOURCE.to_string(),
                message: "credential is not a valid header value".to_string(),
            })
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-client-id",
            header(self.client_id.as_deref().unwrap_or_default())?,
        );
        headers.insert("x-timestamp", header(&timestamp_ms.to_string())?);
        headers.insert("x-signature", header(&signature)?);
        Ok(headers)
    }
}

#[async_trait]
impl SourceAdapter for ValorProSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn pair(&self) -> &str {
        &self.symbol
    }

    fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    async fn fetch(&self) -> Result<Quote, FetchError> {
        let headers = self.signed_headers(Utc::now().timestamp_millis())?;
        let url = format!("{}{}", self.base_url, self.path());
        let payload = get_json(&self.client, SOURCE, &url, headers, self.timeout).await?;
        quote_from_ticker(SOURCE, &self.symbol, &payload)
    }
}
