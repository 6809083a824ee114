//! Yahoo Finance quote provider.
//!
//! Uses the `yahoo_finance_api` connector to pull the last few daily bars of a
//! symbol. The newest bar is the current price and the bar before it gives
//! the previous close. No API key is required.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::{QuoteProvider, RateLimit};

const PROVIDER_ID: &str = "YAHOO";

/// Days of daily history requested; enough to span a long weekend.
const HISTORY_DAYS: i64 = 7;

/// Yahoo Finance quote provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

/// A daily bar reduced to what the quote needs.
#[derive(Clone, Copy, Debug)]
struct Bar {
    timestamp: i64,
    close: f64,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider.
    pub fn new() -> Result<Self, MarketDataError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize Yahoo connector: {}", e),
            })?;
        Ok(Self { connector })
    }

    /// Map a connector error, spotting rate limiting in its message.
    fn map_error(symbol: &str, e: yahoo::YahooError) -> MarketDataError {
        if matches!(e, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
            return MarketDataError::SymbolNotFound(symbol.to_string());
        }

        let message = e.to_string();
        if message.contains("429") || message.to_lowercase().contains("too many requests") {
            return MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            };
        }

        MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message,
        }
    }

    /// Build a quote from daily bars ordered oldest first.
    fn quote_from_bars(symbol: &str, bars: &[Bar]) -> Result<Quote, MarketDataError> {
        let last = bars
            .last()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        let price = Decimal::from_f64(last.close).ok_or_else(|| {
            MarketDataError::ValidationFailed {
                message: format!("Failed to convert close price {} to Decimal", last.close),
            }
        })?;

        let timestamp = Utc
            .timestamp_opt(last.timestamp, 0)
            .single()
            .ok_or_else(|| MarketDataError::ValidationFailed {
                message: format!("Invalid timestamp: {}", last.timestamp),
            })?;

        let previous_close = bars
            .len()
            .checked_sub(2)
            .and_then(|i| bars.get(i))
            .and_then(|bar| Decimal::from_f64(bar.close));

        let mut quote = Quote::new(symbol.to_string(), price, timestamp, PROVIDER_ID.to_string());
        quote.previous_close = previous_close;
        Ok(quote)
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            backoff_base: Duration::from_secs(1),
            min_delay: Duration::from_secs(1),
        }
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        debug!("Fetching latest quote for {} from Yahoo", symbol);

        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(HISTORY_DAYS);

        let response = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| Self::map_error(symbol, e))?;

        let bars: Vec<Bar> = match response.quotes() {
            Ok(quotes) => quotes
                .into_iter()
                .map(|q| Bar {
                    timestamp: q.timestamp as i64,
                    close: q.close,
                })
                .collect(),
            Err(e) => {
                warn!("No quotes returned for {}: {}", symbol, e);
                return Err(Self::map_error(symbol, e));
            }
        };

        Self::quote_from_bars(symbol, &bars)
    }
}
