//! Core types used throughout the oracle
//!
//! Defines the normalized quote snapshot and its serializable record.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pairs quoted directly by upstream sources or derived from them.
pub mod pairs {
    pub const GBPUSDT: &str = "GBPUSDT";
    pub const USDTBRL: &str = "USDTBRL";
    pub const USDBRL: &str = "USDBRL";
    pub const GBPBRL: &str = "GBPBRL";
}

/// Provenance tag for quotes computed from two other quotes
pub const DERIVED_SOURCE: &str = "derived";

/// Provenance tag for the offline simulated source
pub const SIMULATED_SOURCE: &str = "simulated";

/// Current instant as an RFC 3339 UTC string
pub fn utc_now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert an epoch value to RFC 3339. Values above 1e12 are milliseconds.
pub fn epoch_to_rfc3339(epoch: i64) -> Option<String> {
    let dt = if epoch.abs() >= 1_000_000_000_000 {
        Utc.timestamp_millis_opt(epoch).single()?
    } else {
        Utc.timestamp_opt(epoch, 0).single()?
    };
    Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Normalized price snapshot.
///
/// Derived fields (`mid`, `spread_bps`, `staleness_seconds`) are computed once
/// at construction and never refreshed: a quote is a snapshot, not a live view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pair: String,
    bid: f64,
    ask: f64,
    mid: f64,
    spread_bps: f64,
    source: String,
    timestamp: String,
    staleness_seconds: i64,
    is_fallback: bool,
}

impl Quote {
    pub fn new(
        pair: impl Into<String>,
        bid: f64,
        ask: f64,
        source: impl Into<String>,
        timestamp: impl Into<String>,
        is_fallback: bool,
    ) -> Self {
        let timestamp = timestamp.into();
        let mid = (bid + ask) / 2.0;
        let spread_bps = if mid > 0.0 {
            (ask - bid) / mid * 10_000.0
        } else {
            0.0
        };
        let staleness_seconds = staleness_since(&timestamp);

        Self {
            pair: pair.into(),
            bid,
            ask,
            mid,
            spread_bps,
            source: source.into(),
            timestamp,
            staleness_seconds,
            is_fallback,
        }
    }

    /// Quote observed right now
    pub fn observed_now(
        pair: impl Into<String>,
        bid: f64,
        ask: f64,
        source: impl Into<String>,
        is_fallback: bool,
    ) -> Self {
        Self::new(pair, bid, ask, source, utc_now_rfc3339(), is_fallback)
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn bid(&self) -> f64 {
        self.bid
    }

    pub fn ask(&self) -> f64 {
        self.ask
    }

    pub fn mid(&self) -> f64 {
        self.mid
    }

    pub fn spread_bps(&self) -> f64 {
        self.spread_bps
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Seconds between the quote timestamp and its construction, -1 if unparseable
    pub fn staleness_seconds(&self) -> i64 {
        self.staleness_seconds
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    /// Normalized record with display rounding applied
    pub fn to_record(&self) -> QuoteRecord {
        QuoteRecord {
            pair: self.pair.clone(),
            bid: round_to(self.bid, 8),
            ask: round_to(self.ask, 8),
            mid: round_to(self.mid, 8),
            source: self.source.clone(),
            timestamp: self.timestamp.clone(),
            staleness_seconds: self.staleness_seconds,
            spread_bps: round_to(self.spread_bps, 2),
            is_fallback: self.is_fallback,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bid={:.8} ask={:.8} mid={:.8} spread={:.2}bps source={}{}",
            self.pair,
            self.bid,
            self.ask,
            self.mid,
            self.spread_bps,
            self.source,
            if self.is_fallback { " (fallback)" } else { "" }
        )
    }
}

/// Serializable quote record handed to downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub pair: String,
    pub bid: f64,
    pub ask: f64,
    pub mid: f64,
    pub source: String,
    pub timestamp: String,
    pub staleness_seconds: i64,
    pub spread_bps: f64,
    pub is_fallback: bool,
}

fn staleness_since(timestamp: &str) -> i64 {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(ts) => Utc::now()
            .signed_duration_since(ts.with_timezone(&Utc))
            .num_seconds(),
        Err(_) => -1,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
