//! Fallback chains: which sources are tried, in which order, for each pair

use reqwest::Client;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::OracleError;
use crate::oracle::derived::DerivedComputer;
use crate::oracle::sources::{
    BinanceSource, CoinsSource, SimulatedSource, SourceAdapter, ValorProSource,
};
use crate::types::pairs;

/// One step of a fallback chain
#[derive(Clone)]
pub enum ChainLink {
    Source(Arc<dyn SourceAdapter>),
    Derived(DerivedComputer),
}

impl ChainLink {
    pub fn source<S: SourceAdapter + 'static>(adapter: S) -> Self {
        ChainLink::Source(Arc::new(adapter))
    }

    pub fn name(&self) -> &str {
        match self {
            ChainLink::Source(adapter) => adapter.name(),
            ChainLink::Derived(_) => crate::types::DERIVED_SOURCE,
        }
    }
}

impl fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainLink::Source(adapter) => {
                write!(f, "Source({}:{})", adapter.name(), adapter.pair())
            }
            ChainLink::Derived(d) => {
                let [a, b] = d.components();
                write!(f, "Derived({} = {} x {})", d.pair(), a, b)
            }
        }
    }
}

/// Maps a pair to its ordered chain of links
pub trait FallbackResolver: Send + Sync {
    /// Ordered links for `pair`; empty when the pair is unknown
    fn chain(&self, pair: &str) -> &[ChainLink];

    /// Every pair that has a chain
    fn pairs(&self) -> Vec<String>;
}

/// Resolver over a fixed pair → chain table
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    chains: BTreeMap<String, Vec<ChainLink>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the chain for a pair
    pub fn with_chain(mut self, pair: &str, links: Vec<ChainLink>) -> Self {
        self.chains.insert(pair.to_uppercase(), links);
        self
    }

    /// Production chains:
    ///
    /// - GBPUSDT: Binance → Coins.xyz → Simulated
    /// - USDTBRL: Binance → Valor PRO → Coins.xyz → Simulated
    /// - USDBRL: Valor PRO → Binance → Simulated
    /// - GBPBRL: GBPUSDT × USDTBRL
    pub fn from_config(config: &AppConfig, client: &Client) -> Self {
        let timeout = config.oracle.request_timeout();
        let creds = &config.credentials;
        let valorpro_url = config.valorpro.base_url();

        let binance = |symbol: &str| {
            ChainLink::source(BinanceSource::new(
                client.clone(),
                &config.binance.base_url,
                symbol,
                creds.binance_api_key.clone(),
                timeout,
            ))
        };
        let coins = |symbol: &str| {
            ChainLink::source(CoinsSource::new(
                client.clone(),
                &config.coins.base_url,
                symbol,
                creds.coins_api_key.clone(),
                timeout,
            ))
        };
        let valorpro = |symbol: &str| {
            ChainLink::source(ValorProSource::new(
                client.clone(),
                &valorpro_url,
                symbol,
                creds.valorpro_client_id.clone(),
                creds.valorpro_client_secret.clone(),
                timeout,
            ))
        };
        let simulated = |symbol: &str| ChainLink::source(SimulatedSource::new(symbol));

        Self::new()
            .with_chain(
                pairs::GBPUSDT,
                vec![
                    binance(pairs::GBPUSDT),
                    coins(pairs::GBPUSDT),
                    simulated(pairs::GBPUSDT),
                ],
            )
            .with_chain(
                pairs::USDTBRL,
                vec![
                    binance(pairs::USDTBRL),
                    valorpro(pairs::USDTBRL),
                    coins(pairs::USDTBRL),
                    simulated(pairs::USDTBRL),
                ],
            )
            .with_chain(
                pairs::USDBRL,
                vec![
                    valorpro(pairs::USDBRL),
                    binance(pairs::USDBRL),
                    simulated(pairs::USDBRL),
                ],
            )
            .with_chain(
                pairs::GBPBRL,
                vec![ChainLink::Derived(DerivedComputer::new(
                    pairs::GBPBRL,
                    pairs::GBPUSDT,
                    pairs::USDTBRL,
                ))],
            )
    }
}

impl FallbackResolver for StaticResolver {
    fn chain(&self, pair: &str) -> &[ChainLink] {
        self.chains.get(pair).map(Vec::as_slice).unwrap_or(&[])
    }

    fn pairs(&self) -> Vec<String> {
        self.chains.keys().cloned().collect()
    }
}

/// Fail if any derived pair (transitively) depends on itself.
///
/// Derived definitions are static, so this runs once when the oracle is built
/// instead of on every request.
pub fn check_derivation_cycles(resolver: &dyn FallbackResolver) -> Result<(), OracleError> {
    fn visit(
        resolver: &dyn FallbackResolver,
        pair: &str,
        path: &mut Vec<String>,
        done: &mut HashSet<String>,
    ) -> Result<(), OracleError> {
        if done.contains(pair) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|p| p == pair) {
            let mut cycle = path[start..].to_vec();
            cycle.push(pair.to_string());
            return Err(OracleError::DerivationCycle {
                pair: pair.to_string(),
                path: cycle.join(" -> "),
            });
        }

        path.push(pair.to_string());
        for link in resolver.chain(pair) {
            if let ChainLink::Derived(derived) = link {
                for component in derived.components() {
                    visit(resolver, component, path, done)?;
                }
            }
        }
        path.pop();
        done.insert(pair.to_string());
        Ok(())
    }

    let mut done = HashSet::new();
    for pair in resolver.pairs() {
        visit(resolver, &pair, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_resolver() -> StaticResolver {
        StaticResolver::from_config(&AppConfig::default(), &Client::new())
    }

    fn names(resolver: &StaticResolver, pair: &str) -> Vec<String> {
        resolver
            .chain(pair)
            .iter()
            .map(|link| link.name().to_string())
            .collect()
    }

    #[test]
    fn test_default_chain_order() {
        let resolver = default_resolver();
        assert_eq!(names(&resolver, "GBPUSDT"), ["binance", "coins", "simulated"]);
        assert_eq!(
            names(&resolver, "USDTBRL"),
            ["binance", "valorpro", "coins", "simulated"]
        );
        assert_eq!(names(&resolver, "USDBRL"), ["valorpro", "binance", "simulated"]);
        assert_eq!(names(&resolver, "GBPBRL"), ["derived"]);
    }

    #[test]
    fn test_adapters_are_bound_to_their_pair() {
        let resolver = default_resolver();
        for pair in resolver.pairs() {
            for link in resolver.chain(&pair) {
                if let ChainLink::Source(adapter) = link {
                    assert_eq!(adapter.pair(), pair);
                }
            }
        }
    }

    #[test]
    fn test_unknown_pair_has_empty_chain() {
        assert!(default_resolver().chain("EURJPY").is_empty());
    }

    #[test]
    fn test_default_resolver_is_acyclic() {
        assert!(check_derivation_cycles(&default_resolver()).is_ok());
    }

    #[test]
    fn test_cycle_is_detected() {
        let resolver = StaticResolver::new()
            .with_chain(
                "AAABBB",
                vec![ChainLink::Derived(DerivedComputer::new("AAABBB", "AAACCC", "CCCBBB"))],
            )
            .with_chain(
                "CCCBBB",
                vec![ChainLink::Derived(DerivedComputer::new("CCCBBB", "CCCAAA", "AAABBB"))],
            );
        let err = check_derivation_cycles(&resolver).unwrap_err();
        assert!(matches!(err, OracleError::DerivationCycle { .. }));
        assert!(err.to_string().contains("AAABBB -> CCCBBB -> AAABBB"));
    }

    #[test]
    fn test_self_referential_pair_is_detected() {
        let resolver = StaticResolver::new().with_chain(
            "XY",
            vec![ChainLink::Derived(DerivedComputer::new("XY", "XY", "YY"))],
        );
        assert!(check_derivation_cycles(&resolver).is_err());
    }
}
