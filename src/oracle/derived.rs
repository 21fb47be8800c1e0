//! Derived cross-rates
//!
//! A derived pair is the product of two component pairs. Bid and ask are
//! composed independently so the cross keeps the wider of both spreads.

use async_trait::async_trait;

use crate::error::{FetchError, QuoteUnavailable};
use crate::types::{Quote, DERIVED_SOURCE};

/// Anything able to resolve a pair to a quote (the oracle, or a test stub)
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, pair: &str) -> Result<Quote, QuoteUnavailable>;
}

/// Definition of a cross-rate `pair = first × second`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedComputer {
    pair: String,
    first: String,
    second: String,
}

impl DerivedComputer {
    pub fn new(pair: &str, first: &str, second: &str) -> Self {
        Self {
            pair: pair.to_uppercase(),
            first: first.to_uppercase(),
            second: second.to_uppercase(),
        }
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    /// Component pairs this derivation depends on
    pub fn components(&self) -> [&str; 2] {
        [self.first.as_str(), self.second.as_str()]
    }

    /// Resolve both legs concurrently and compose them
    pub async fn compute(&self, provider: &dyn QuoteProvider) -> Result<Quote, FetchError> {
        let (first, second) = tokio::join!(
            provider.quote(&self.first),
            provider.quote(&self.second)
        );
        let first = first.map_err(|e| self.leg_failed(&self.first, e))?;
        let second = second.map_err(|e| self.leg_failed(&self.second, e))?;
        Ok(self.compose(&first, &second))
    }

    /// Pure composition of two component quotes
    pub fn compose(&self, first: &Quote, second: &Quote) -> Quote {
        Quote::observed_now(
            &self.pair,
            first.bid() * second.bid(),
            first.ask() * second.ask(),
            DERIVED_SOURCE,
            // A cross built on a degraded leg is itself degraded
            first.is_fallback() || second.is_fallback(),
        )
    }

    fn leg_failed(&self, component: &str, cause: QuoteUnavailable) -> FetchError {
        FetchError::Derivation {
            pair: self.pair.clone(),
            component: component.to_string(),
            cause: cause.to_string(),
        }
    }
}
