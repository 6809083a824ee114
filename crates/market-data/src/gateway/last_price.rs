//! Last-seen price per ticker.
//!
//! Used to tell whether a ticker moved up, down or not at all since the
//! previous poll. The cache is in-memory, never evicts, and resets on
//! application restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::warn;
use rust_decimal::Decimal;

/// Thread-safe map from uppercased ticker to the last price seen for it.
#[derive(Debug, Default)]
pub struct LastPriceCache {
    prices: Mutex<HashMap<String, Decimal>>,
}

impl LastPriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the prices mutex, recovering from poison if necessary.
    ///
    /// Every write is a single insert, so a poisoned map is still consistent.
    fn lock_prices(&self) -> MutexGuard<'_, HashMap<String, Decimal>> {
        self.prices.lock().unwrap_or_else(|poisoned| {
            warn!("Last price cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Store `price` as the latest price of `ticker` and return the one it
    /// replaces.
    ///
    /// Read and write happen under one lock, so two concurrent polls of the
    /// same ticker each see a distinct predecessor.
    pub fn record(&self, ticker: &str, price: Decimal) -> Option<Decimal> {
        self.lock_prices().insert(ticker.to_uppercase(), price)
    }

    /// Last price seen for `ticker`, if any.
    pub fn last_price(&self, ticker: &str) -> Option<Decimal> {
        self.lock_prices().get(&ticker.to_uppercase()).copied()
    }

    /// Number of tickers seen so far.
    pub fn len(&self) -> usize {
        self.lock_prices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_prices().is_empty()
    }

    /// Forget every ticker.
    pub fn clear(&self) {
        self.lock_prices().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_record_returns_previous_price() {
        let cache = LastPriceCache::new();
        assert_eq!(cache.record("AAPL", dec!(100)), None);
        assert_eq!(cache.record("AAPL", dec!(101)), Some(dec!(100)));
        assert_eq!(cache.last_price("AAPL"), Some(dec!(101)));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let cache = LastPriceCache::new();
        cache.record("aapl", dec!(100));
        assert_eq!(cache.last_price("AAPL"), Some(dec!(100)));
        assert_eq!(cache.record("Aapl", dec!(99)), Some(dec!(100)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = LastPriceCache::new();
        cache.record("AAPL", dec!(100));
        cache.record("MSFT", dec!(300));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.last_price("AAPL"), None);
    }

    #[test]
    fn test_concurrent_records_see_distinct_predecessors() {
        let cache = Arc::new(LastPriceCache::new());
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.record("SPY", Decimal::from(i)))
            })
            .collect();

        let mut previous: Vec<Option<Decimal>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        previous.sort();

        // Exactly one writer saw an empty slot; the others each replaced a
        // different price.
        assert_eq!(previous.iter().filter(|p| p.is_none()).count(), 1);
        let mut seen: Vec<Decimal> = previous.into_iter().flatten().collect();
        seen.dedup();
        assert_eq!(seen.len(), 7);
    }
}
