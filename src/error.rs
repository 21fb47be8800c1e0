//! Oracle error types
//!
//! `FetchError` stays inside the oracle: one per failed chain link.
//! `QuoteUnavailable` is the only failure a consumer ever sees.

use std::fmt;
use thiserror::Error;

/// Failure of a single chain link (adapter or derivation)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Timeout, connection refused, TLS failure, unreadable body
    #[error("{source_name}: transport error: {message}")]
    Transport {
        source_name: String,
        message: String,
    },

    /// Non-2xx status, malformed payload, missing/invalid bid or ask
    #[error("{source_name}: upstream rejected: {reason}")]
    UpstreamRejection {
        source_name: String,
        reason: String,
    },

    /// Signed provider without a signing secret
    #[error("{source_name}: signature config error: {message}")]
    SignatureConfig {
        source_name: String,
        message: String,
    },

    /// Adapter has no quote for this pair
    #[error("{source_name}: pair {pair} not supported")]
    UnsupportedPair { source_name: String, pair: String },

    /// One or both legs of a derived pair could not be resolved
    #[error("derived {pair}: component {component} unavailable: {cause}")]
    Derivation {
        pair: String,
        component: String,
        cause: String,
    },
}

impl FetchError {
    pub fn transport(source_name: &str, message: impl fmt::Display) -> Self {
        FetchError::Transport {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }

    pub fn rejected(source_name: &str, reason: impl fmt::Display) -> Self {
        FetchError::UpstreamRejection {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::UpstreamRejection { .. } => "upstream_rejection",
            FetchError::SignatureConfig { .. } => "signature_config",
            FetchError::UnsupportedPair { .. } => "unsupported_pair",
            FetchError::Derivation { .. } => "derivation",
        }
    }
}

/// Caller-visible "no quote available" result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteUnavailable {
    /// Every link in the pair's chain failed
    #[error("no quote available for {pair}: {} source(s) failed", .failures.len())]
    ChainExhausted {
        pair: String,
        failures: Vec<FetchError>,
    },

    /// No chain is defined for the pair
    #[error("no sources configured for pair {pair}")]
    UnknownPair { pair: String },
}

impl QuoteUnavailable {
    pub fn pair(&self) -> &str {
        match self {
            QuoteUnavailable::ChainExhausted { pair, .. } => pair,
            QuoteUnavailable::UnknownPair { pair } => pair,
        }
    }
}

/// Errors raised while assembling an oracle
#[derive(Debug, Error)]
pub enum OracleError {
    /// Derived pair definitions reference each other
    #[error("derived pair {pair} depends on itself (cycle: {path})")]
    DerivationCycle { pair: String, path: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
