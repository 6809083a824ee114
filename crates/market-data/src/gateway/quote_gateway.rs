use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::last_price::LastPriceCache;
use super::response_cache::{ResponseCache, DEFAULT_PRICE_CACHE_TTL};
use super::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::errors::MarketDataError;
use crate::models::{parse_ticker_list, BatchQuotes, PriceQuote, Quote, Ticker, TickerQuote};
use crate::provider::QuoteProvider;

/// Front door for quote lookups.
///
/// Owns the retry policy, the pacing between batch calls and the `/price`
/// response cache. The last-price cache is shared, so several gateways (or a
/// test) can observe the same history.
pub struct QuoteGateway {
    provider: Arc<dyn QuoteProvider>,
    last_prices: Arc<LastPriceCache>,
    responses: ResponseCache,
    retry: RetryPolicy,
    pacing: Duration,
}

impl QuoteGateway {
    /// Build a gateway with the provider's own backoff and pacing, three
    /// attempts per ticker and a five minute response cache.
    pub fn new(provider: Arc<dyn QuoteProvider>, last_prices: Arc<LastPriceCache>) -> Self {
        let limit = provider.rate_limit();
        Self {
            provider,
            last_prices,
            responses: ResponseCache::new(DEFAULT_PRICE_CACHE_TTL),
            retry: RetryPolicy::new(DEFAULT_MAX_ATTEMPTS, limit.backoff_base),
            pacing: limit.min_delay,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Delay between successive upstream calls of one batch.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// TTL of the single-ticker response cache. Zero disables it.
    pub fn with_price_cache_ttl(mut self, ttl: Duration) -> Self {
        self.responses = ResponseCache::new(ttl);
        self
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    pub fn last_prices(&self) -> &Arc<LastPriceCache> {
        &self.last_prices
    }

    /// Current price of one ticker, with change against the previous close.
    ///
    /// # Errors
    ///
    /// `InvalidTicker` for malformed input, `RetriesExhausted` when the
    /// upstream kept rate limiting, and whatever terminal error the provider
    /// reported otherwise.
    pub async fn get_quote(&self, raw: &str) -> Result<PriceQuote, MarketDataError> {
        let ticker = Ticker::parse(raw)?;

        if let Some(cached) = self.responses.get(ticker.symbol()) {
            debug!(ticker = %ticker, "serving cached price");
            return Ok(cached);
        }

        let quote = self.fetch(&ticker).await?;
        let price = PriceQuote::from_quote(&ticker, &quote);

        self.last_prices.record(ticker.symbol(), quote.price);
        self.responses.insert(ticker.symbol(), price.clone());

        Ok(price)
    }

    /// Current prices of a comma-separated ticker list.
    ///
    /// Tickers are fetched one after another, paced by the provider's minimum
    /// delay. A ticker that fails is reported in [`BatchQuotes::failed`]
    /// instead of failing the request.
    ///
    /// # Errors
    ///
    /// `InvalidTicker` when any segment is malformed or the list is empty,
    /// `MissingApiKey` as soon as the provider reports it, and
    /// `AllTickersFailed` when not a single ticker resolved.
    pub async fn get_quotes(&self, raw: &str) -> Result<BatchQuotes, MarketDataError> {
        let tickers = parse_ticker_list(raw)?;
        let mut batch = BatchQuotes::default();

        for (index, ticker) in tickers.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            match self.fetch(ticker).await {
                Ok(quote) => {
                    let last_seen = self.last_prices.record(ticker.symbol(), quote.price);
                    batch
                        .quotes
                        .push(TickerQuote::from_observation(ticker, &quote, last_seen));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "skipping ticker");
                    batch.failed.push(ticker.symbol().to_string());
                }
            }
        }

        if batch.quotes.is_empty() {
            return Err(MarketDataError::AllTickersFailed {
                tickers: batch.failed,
            });
        }

        info!(
            provider = self.provider.id(),
            resolved = batch.quotes.len(),
            failed = batch.failed.len(),
            "batch quotes fetched"
        );
        Ok(batch)
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<Quote, MarketDataError> {
        if ticker.is_proxied() {
            debug!(
                ticker = %ticker,
                upstream = ticker.upstream_symbol(),
                "querying index through its ETF proxy"
            );
        }

        let provider = self.provider.as_ref();
        let symbol = ticker.upstream_symbol();
        self.retry
            .run(provider.id(), || provider.get_latest_quote(symbol))
            .await
    }
}
