//! Offline simulated source with fixed realistic books

use async_trait::async_trait;

use crate::error::FetchError;
use crate::oracle::sources::SourceAdapter;
use crate::types::{pairs, Quote, SIMULATED_SOURCE};

/// Fixed (bid, ask) for the supported symbols
const SIMULATED_BOOKS: [(&str, f64, f64); 3] = [
    (pairs::GBPUSDT, 1.2745, 1.2755),
    (pairs::USDTBRL, 5.1850, 5.1900),
    (pairs::USDBRL, 5.1790, 5.1830),
];

#[derive(Debug, Clone)]
pub struct SimulatedSource {
    symbol: String,
}

impl SimulatedSource {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
        }
    }

    pub fn supports(symbol: &str) -> bool {
        Self::book(symbol).is_some()
    }

    fn book(symbol: &str) -> Option<(f64, f64)> {
        SIMULATED_BOOKS
            .iter()
            .find(|(pair, _, _)| pair.eq_ignore_ascii_case(symbol))
            .map(|&(_, bid, ask)| (bid, ask))
    }

    /// Synchronous quote, used by the oracle's last-resort path
    pub fn quote(&self) -> Result<Quote, FetchError> {
        let (bid, ask) = Self::book(&self.symbol).ok_or_else(|| FetchError::UnsupportedPair {
            source_name: SIMULATED_SOURCE.to_string(),
            pair: self.symbol.clone(),
        })?;
        Ok(Quote::observed_now(&self.symbol, bid, ask, SIMULATED_SOURCE, true))
    }
}

#[async_trait]
impl SourceAdapter for SimulatedSource {
    fn name(&self) -> &'static str {
        SIMULATED_SOURCE
    }

    fn pair(&self) -> &str {
        &self.symbol
    }

    async fn fetch(&self) -> Result<Quote, FetchError> {
        self.quote()
    }
}
