//! Quote cache with a store-time TTL
//!
//! Validity is measured from when the entry was stored, independent of the
//! quote's own timestamp. Expired entries read as misses and are overwritten
//! on the next put.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::Quote;

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: Quote,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_valid(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Thread-safe per-pair quote cache
#[derive(Debug)]
pub struct QuoteCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached quote for `pair` if stored less than one TTL ago
    pub async fn get(&self, pair: &str) -> Option<Quote> {
        let entries = self.entries.read().await;
        match entries.get(pair) {
            Some(entry) if entry.is_valid(self.ttl) => {
                debug!(pair = %pair, "Cache hit");
                Some(entry.quote.clone())
            }
            Some(_) => {
                debug!(pair = %pair, "Cache entry expired");
                None
            }
            None => {
                debug!(pair = %pair, "Cache miss");
                None
            }
        }
    }

    /// Store a quote under its own pair, superseding any previous entry
    pub async fn put(&self, quote: Quote) {
        let entry = CacheEntry {
            stored_at: Instant::now(),
            quote,
        };
        let mut entries = self.entries.write().await;
        entries.insert(entry.quote.pair().to_string(), entry);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
