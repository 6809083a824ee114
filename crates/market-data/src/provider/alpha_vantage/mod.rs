//! Alpha Vantage quote provider implementation.
//!
//! This module provides latest quotes from the Alpha Vantage API via the
//! GLOBAL_QUOTE endpoint.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute, and it
//! reports rate limiting in the response body as often as with HTTP 429.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::{QuoteProvider, RateLimit};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Alpha Vantage quote provider.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// An unknown symbol comes back as `"Global Quote": {}`, so every field is optional.
#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

impl GlobalQuote {
    fn is_empty(&self) -> bool {
        self.symbol.is_none() && self.price.is_none()
    }
}

// ============================================================================
// AlphaVantageProvider implementation
// ============================================================================

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a request to the Alpha Vantage API.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        let url = reqwest::Url::parse_with_params(BASE_URL, &all_params).map_err(|e| {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to build URL: {}", e),
            }
        })?;

        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            Self::transport_error(e.is_timeout(), &e.to_string().replace(&self.api_key, "***"))
        })?;

        if let Some(err) = Self::error_for_status(response.status()) {
            return Err(err);
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })
    }

    /// Error for a request that never produced a response. `detail` must
    /// already have the key masked.
    fn transport_error(timed_out: bool, detail: &str) -> MarketDataError {
        if timed_out {
            MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            }
        } else {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: detail.to_string(),
            }
        }
    }

    /// Map a non-success status to an error. Rate limiting that arrives with
    /// a 200 is caught later, in the body.
    fn error_for_status(status: StatusCode) -> Option<MarketDataError> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Some(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            return Some(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        None
    }

    /// Check for API-level errors in the response.
    fn check_api_error(
        error_message: &Option<String>,
        note: &Option<String>,
        information: &Option<String>,
    ) -> Result<(), MarketDataError> {
        if let Some(ref msg) = error_message {
            // Check if it's a "not found" type error
            if msg.contains("Invalid API call") || msg.contains("not found") {
                return Err(MarketDataError::SymbolNotFound(msg.clone()));
            }
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg.clone(),
            });
        }

        // "Note" usually indicates rate limiting
        if let Some(ref msg) = note {
            if Self::mentions_rate_limit(msg) {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage note: {}", msg);
        }

        // "Information" can indicate various issues
        if let Some(ref msg) = information {
            if Self::mentions_rate_limit(msg) {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage info: {}", msg);
        }

        Ok(())
    }

    fn mentions_rate_limit(msg: &str) -> bool {
        let msg = msg.to_lowercase();
        msg.contains("api call frequency") || msg.contains("rate limit")
    }

    /// Parse a date string in YYYY-MM-DD format to DateTime<Utc>.
    fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|dt| Utc.from_local_datetime(&dt).single())
    }

    /// Parse a decimal value from a string.
    fn parse_decimal(s: &str) -> Option<Decimal> {
        Decimal::from_str(s.trim()).ok()
    }

    /// Parse a percent string like "1.2345%".
    fn parse_percent(s: &str) -> Option<Decimal> {
        Self::parse_decimal(s.trim().trim_end_matches('%'))
    }

    /// Turn a GLOBAL_QUOTE body into a quote.
    fn parse_global_quote(symbol: &str, body: &str) -> Result<Quote, MarketDataError> {
        let response: GlobalQuoteResponse =
            serde_json::from_str(body).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse response: {}", e),
            })?;

        Self::check_api_error(
            &response.error_message,
            &response.note,
            &response.information,
        )?;

        let quote = response
            .global_quote
            .filter(|q| !q.is_empty())
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        // A missing price is a malformed payload, not a zero price.
        let price = quote
            .price
            .as_deref()
            .and_then(Self::parse_decimal)
            .ok_or_else(|| MarketDataError::ValidationFailed {
                message: format!("No valid price for {}", symbol),
            })?;

        let timestamp = quote
            .latest_trading_day
            .as_deref()
            .and_then(Self::parse_date)
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: quote.symbol.unwrap_or_else(|| symbol.to_string()),
            price,
            previous_close: quote.previous_close.as_deref().and_then(Self::parse_decimal),
            change: quote.change.as_deref().and_then(Self::parse_decimal),
            change_percent: quote.change_percent.as_deref().and_then(Self::parse_percent),
            timestamp,
            source: PROVIDER_ID.to_string(),
        })
    }
}

// ============================================================================
// QuoteProvider trait implementation
// ============================================================================

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            backoff_base: Duration::from_secs(1), // 1s, then 2s
            min_delay: Duration::from_secs(1),
        }
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let params = [("function", "GLOBAL_QUOTE"), ("symbol", symbol)];
        let body = self.fetch(&params).await?;
        Self::parse_global_quote(symbol, &body)
    }
}
