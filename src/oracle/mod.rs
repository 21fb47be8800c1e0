//! Oracle module - quote resolution with source fallback
//!
//! `PriceOracle` is the single entry point. Per request it walks
//! CHECK_CACHE → TRY_SOURCES → (SUCCESS | EXHAUSTED):
//!
//! - a valid cache entry is returned without touching the network
//! - otherwise the pair's chain is tried strictly in order, first success wins
//!   and is cached
//! - when every link fails, the simulated source answers if permitted,
//!   else the caller gets `QuoteUnavailable`
//!
//! Concurrent requests for the same pair share a single chain resolution.

mod cache;
mod chain;
mod derived;
pub mod sources;

pub use cache::QuoteCache;
pub use chain::{check_derivation_cycles, ChainLink, FallbackResolver, StaticResolver};
pub use derived::{DerivedComputer, QuoteProvider};

use async_trait::async_trait;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, OracleConfig};
use crate::error::{FetchError, OracleError, QuoteUnavailable};
use crate::types::{Quote, QuoteRecord};
use sources::SimulatedSource;

type Resolution = Result<Quote, QuoteUnavailable>;
type Flight = Arc<OnceCell<Resolution>>;

/// Runtime knobs of the oracle
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub cache_ttl: Duration,
    pub allow_simulated: bool,
    pub tracked_pairs: Vec<String>,
}

impl From<&OracleConfig> for OracleSettings {
    fn from(config: &OracleConfig) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            allow_simulated: config.allow_simulated,
            tracked_pairs: config
                .tracked_pairs
                .iter()
                .map(|p| normalize_pair(p))
                .collect(),
        }
    }
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self::from(&OracleConfig::default())
    }
}

struct OracleInner {
    resolver: Arc<dyn FallbackResolver>,
    cache: QuoteCache,
    settings: OracleSettings,
    in_flight: Mutex<HashMap<String, Flight>>,
}

/// Cheaply cloneable handle; clones share cache and in-flight state
#[derive(Clone)]
pub struct PriceOracle {
    inner: Arc<OracleInner>,
}

impl PriceOracle {
    /// Build an oracle over an arbitrary resolver.
    ///
    /// Fails if derived pair definitions form a cycle.
    pub fn new(
        resolver: Arc<dyn FallbackResolver>,
        settings: OracleSettings,
    ) -> Result<Self, OracleError> {
        check_derivation_cycles(resolver.as_ref())?;

        Ok(Self {
            inner: Arc::new(OracleInner {
                resolver,
                cache: QuoteCache::new(settings.cache_ttl),
                settings,
                in_flight: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Build the production oracle: shared HTTP client and default chains
    pub fn from_config(config: &AppConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.oracle.request_timeout())
            .user_agent(concat!("fx-oracle/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let resolver = StaticResolver::from_config(config, &client);

        info!(config = %config, "Price oracle configured");
        Self::new(Arc::new(resolver), OracleSettings::from(&config.oracle))
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.inner.settings
    }

    /// Resolve a quote for `pair`, from cache when allowed
    pub async fn get_price(&self, pair: &str, use_cache: bool) -> Resolution {
        let pair = normalize_pair(pair);

        if use_cache {
            if let Some(quote) = self.inner.cache.get(&pair).await {
                return Ok(quote);
            }
        }

        self.single_flight(&pair, use_cache).await
    }

    /// Resolve every tracked pair in parallel. Pairs that cannot be resolved
    /// are logged and left out of the result.
    pub async fn get_all_prices(&self) -> BTreeMap<String, QuoteRecord> {
        let mut tasks = JoinSet::new();
        for pair in &self.inner.settings.tracked_pairs {
            let oracle = self.clone();
            let pair = pair.clone();
            tasks.spawn(async move {
                let result = oracle.get_price(&pair, true).await;
                (pair, result)
            });
        }

        let mut records = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((pair, Ok(quote))) => {
                    records.insert(pair, quote.to_record());
                }
                Ok((pair, Err(e))) => {
                    warn!(pair = %pair, error = %e, "Pair omitted from snapshot");
                }
                Err(e) => {
                    error!(error = %e, "Price task failed");
                }
            }
        }
        records
    }

    /// Whether each provider in any chain has its credentials configured
    pub fn provider_status(&self) -> BTreeMap<String, bool> {
        let resolver = &self.inner.resolver;
        let mut status = BTreeMap::new();
        for pair in resolver.pairs() {
            for link in resolver.chain(&pair) {
                if let ChainLink::Source(adapter) = link {
                    status.insert(adapter.name().to_string(), adapter.is_configured());
                }
            }
        }
        status
    }

    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await;
    }

    /// Join the in-flight resolution for `pair`, or start one.
    ///
    /// A flight that starts right after another one finished re-reads the
    /// cache first, so a late caller does not repeat the fetch just stored.
    async fn single_flight(&self, pair: &str, use_cache: bool) -> Resolution {
        let flight = {
            let mut in_flight = self.inner.in_flight.lock().await;
            in_flight
                .entry(pair.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = flight
            .get_or_init(|| async {
                if use_cache {
                    if let Some(quote) = self.inner.cache.get(pair).await {
                        return Ok(quote);
                    }
                }
                self.resolve(pair).await
            })
            .await
            .clone();

        let mut in_flight = self.inner.in_flight.lock().await;
        if in_flight
            .get(pair)
            .is_some_and(|current| Arc::ptr_eq(current, &flight))
        {
            in_flight.remove(pair);
        }

        result
    }

    /// Walk the fallback chain for `pair`
    async fn resolve(&self, pair: &str) -> Resolution {
        let chain = self.inner.resolver.chain(pair);
        if chain.is_empty() {
            warn!(pair = %pair, "No sources configured for pair");
            return Err(QuoteUnavailable::UnknownPair {
                pair: pair.to_string(),
            });
        }

        let mut failures = Vec::new();
        for (rank, link) in chain.iter().enumerate() {
            debug!(pair = %pair, source = %link.name(), rank, "Trying source");

            let attempt = match link {
                ChainLink::Source(adapter) => adapter.fetch().await,
                ChainLink::Derived(derived) => derived.compute(self).await,
            };

            match attempt.and_then(|quote| check_pair(link, pair, quote)) {
                Ok(quote) => {
                    info!(
                        pair = %pair,
                        source = %quote.source(),
                        bid = quote.bid(),
                        ask = quote.ask(),
                        spread_bps = quote.spread_bps(),
                        fallback = quote.is_fallback(),
                        "✅ Quote accepted"
                    );
                    self.inner.cache.put(quote.clone()).await;
                    return Ok(quote);
                }
                Err(e) => {
                    warn!(
                        pair = %pair,
                        source = %link.name(),
                        kind = e.kind(),
                        error = %e,
                        "Source failed, falling back"
                    );
                    failures.push(e);
                }
            }
        }

        if self.inner.settings.allow_simulated && SimulatedSource::supports(pair) {
            match SimulatedSource::new(pair).quote() {
                Ok(quote) => {
                    warn!(
                        pair = %pair,
                        failed = failures.len(),
                        "⚠️ All sources failed, using simulated quote"
                    );
                    return Ok(quote);
                }
                Err(e) => failures.push(e),
            }
        }

        error!(pair = %pair, failed = failures.len(), "❌ No quote available");
        Err(QuoteUnavailable::ChainExhausted {
            pair: pair.to_string(),
            failures,
        })
    }
}

#[async_trait]
impl QuoteProvider for PriceOracle {
    async fn quote(&self, pair: &str) -> Result<Quote, QuoteUnavailable> {
        self.get_price(pair, true).await
    }
}

fn normalize_pair(pair: &str) -> String {
    pair.trim().to_uppercase()
}

/// A link must answer for the pair it was asked about
fn check_pair(link: &ChainLink, pair: &str, quote: Quote) -> Result<Quote, FetchError> {
    if quote.pair() == pair {
        Ok(quote)
    } else {
        Err(FetchError::rejected(
            link.name(),
            format!("returned a quote for {} instead of {}", quote.pair(), pair),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_pair() {
        let oracle =
            PriceOracle::new(Arc::new(StaticResolver::new()), OracleSettings::default()).unwrap();
        let err = oracle.get_price("EURJPY", true).await.unwrap_err();
        assert_eq!(
            err,
            QuoteUnavailable::UnknownPair {
                pair: "EURJPY".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_pair_is_normalized() {
        let resolver = StaticResolver::new().with_chain(
            "GBPUSDT",
            vec![ChainLink::source(SimulatedSource::new("GBPUSDT"))],
        );
        let oracle = PriceOracle::new(Arc::new(resolver), OracleSettings::default()).unwrap();
        let quote = oracle.get_price(" gbpusdt ", true).await.unwrap();
        assert_eq!(quote.pair(), "GBPUSDT");
    }

    #[test]
    fn test_cyclic_resolver_is_rejected() {
        let resolver = StaticResolver::new().with_chain(
            "AB",
            vec![ChainLink::Derived(DerivedComputer::new("AB", "AB", "BB"))],
        );
        assert!(PriceOracle::new(Arc::new(resolver), OracleSettings::default()).is_err());
    }

    #[test]
    fn test_provider_status_from_config() {
        let mut config = AppConfig::default();
        config.credentials.coins_api_key = Some("k".to_string());
        let oracle = PriceOracle::from_config(&config).unwrap();
        let status = oracle.provider_status();
        assert_eq!(status.get("coins"), Some(&true));
        assert_eq!(status.get("binance"), Some(&false));
        assert_eq!(status.get("valorpro"), Some(&false));
        assert_eq!(status.get("simulated"), Some(&true));
    }
}
