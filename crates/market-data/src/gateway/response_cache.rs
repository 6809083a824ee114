//! Short-lived cache of single-ticker price payloads.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::warn;
use tokio::time::Instant;

use crate::models::PriceQuote;

/// Default time a cached price stays fresh.
pub const DEFAULT_PRICE_CACHE_TTL: Duration = Duration::from_secs(300);

struct Entry {
    stored_at: Instant,
    quote: PriceQuote,
}

/// TTL cache of [`PriceQuote`]s keyed by uppercased ticker.
///
/// A zero TTL disables the cache: nothing is stored and every lookup misses.
/// Expired entries are dropped lazily on lookup.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Response cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fresh cached price for `ticker`, if any.
    pub fn get(&self, ticker: &str) -> Option<PriceQuote> {
        if !self.is_enabled() {
            return None;
        }

        let key = ticker.to_uppercase();
        let mut entries = self.lock_entries();
        match entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.quote.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, ticker: &str, quote: PriceQuote) {
        if !self.is_enabled() {
            return;
        }

        self.lock_entries().insert(
            ticker.to_uppercase(),
            Entry {
                stored_at: Instant::now(),
                quote,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_CACHE_TTL)
    }
}
