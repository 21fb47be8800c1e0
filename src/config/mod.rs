//! Configuration management for the FX oracle
//!
//! Loads defaults, optional YAML/TOML files, and environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    pub binance: BinanceConfig,
    pub coins: CoinsConfig,
    pub valorpro: ValorProConfig,
    /// Provider secrets, read from the plain environment after loading
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Cache validity measured from store time, in seconds
    pub cache_ttl_secs: u64,
    /// Per-request upstream timeout in seconds
    pub request_timeout_secs: u64,
    /// Answer from the simulated source when a whole chain fails
    pub allow_simulated: bool,
    /// Pairs resolved by `get_all_prices`
    pub tracked_pairs: Vec<String>,
}

impl OracleConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 10,
            request_timeout_secs: 5,
            allow_simulated: false,
            tracked_pairs: DEFAULT_TRACKED_PAIRS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceConfig {
    /// Spot REST base URL
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinsConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValorProConfig {
    /// Base URL template, `{}` is replaced by the API subdomain
    pub base_url_template: String,
}

impl ValorProConfig {
    pub fn base_url(&self) -> String {
        self.base_url_template
            .replace("{}", "api")
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            binance: BinanceConfig {
                base_url: DEFAULT_BINANCE_URL.to_string(),
            },
            coins: CoinsConfig {
                base_url: DEFAULT_COINS_URL.to_string(),
            },
            valorpro: ValorProConfig {
                base_url_template: DEFAULT_VALORPRO_TEMPLATE.to_string(),
            },
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Oracle defaults
            .set_default("oracle.cache_ttl_secs", 10)?
            .set_default("oracle.request_timeout_secs", 5)?
            .set_default("oracle.allow_simulated", false)?
            .set_default("oracle.tracked_pairs", DEFAULT_TRACKED_PAIRS.to_vec())?
            // Provider endpoints
            .set_default("binance.base_url", DEFAULT_BINANCE_URL)?
            .set_default("coins.base_url", DEFAULT_COINS_URL)?
            .set_default(
                "valorpro.base_url_template",
                std::env::var("VALORPRO_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_VALORPRO_TEMPLATE.to_string()),
            )?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (FXORACLE__*)
            .add_source(Environment::with_prefix("FXORACLE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.credentials = Credentials::from_env();
        app_config.validate()?;

        Ok(app_config)
    }

    /// Reject settings the oracle cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.oracle.request_timeout_secs == 0 {
            bail!("oracle.request_timeout_secs must be greater than zero");
        }
        if self.oracle.tracked_pairs.is_empty() {
            bail!("oracle.tracked_pairs must name at least one pair");
        }
        if !self.valorpro.base_url_template.contains("{}") {
            bail!(
                "valorpro.base_url_template must contain a '{{}}' placeholder, got {}",
                self.valorpro.base_url_template
            );
        }
        Ok(())
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "ttl={}s timeout={}s simulated={} pairs={:?} creds[binance={} coins={} valorpro={}]",
            self.oracle.cache_ttl_secs,
            self.oracle.request_timeout_secs,
            self.oracle.allow_simulated,
            self.oracle.tracked_pairs,
            self.credentials.binance_api_key.is_some(),
            self.credentials.coins_api_key.is_some(),
            self.credentials.valorpro_client_secret.is_some(),
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
