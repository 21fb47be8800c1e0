//! FX Oracle Library
//!
//! Freshness-bounded FX/crypto quotes aggregated from unreliable REST sources,
//! with ordered fallback, short-lived caching and derived cross-rates.

pub mod config;
pub mod error;
pub mod oracle;
pub mod types;

pub use error::{FetchError, OracleError, QuoteUnavailable};
pub use oracle::{OracleSettings, PriceOracle};
pub use types::{Quote, QuoteRecord};
