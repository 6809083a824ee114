//! Finnhub quote provider implementation.
//!
//! This module provides latest quotes from the Finnhub API via the /quote
//! endpoint.
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::{QuoteProvider, RateLimit};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    /// Previous close price
    pc: Option<f64>,
    /// Timestamp (Unix)
    t: Option<i64>,
}

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub quote provider.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a GET request to the Finnhub API.
    async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, MarketDataError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        // API key goes in a header, never in the logged URL
        let request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(params);

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        let response = request
            .send()
            .await
            .map_err(|e| Self::transport_error(e.is_timeout(), &e.to_string()))?;

        let status = response.status();
        if let Some(err) = Self::error_for_status(status) {
            return Err(err);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error_from_body(status, &body));
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }

    /// Error for a request that never produced a response.
    fn transport_error(timed_out: bool, detail: &str) -> MarketDataError {
        if timed_out {
            MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            }
        } else {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Request failed: {}", detail),
            }
        }
    }

    /// Errors decided by the status code alone.
    ///
    /// 403 is how Finnhub reports an exhausted quota, so it is rate limiting.
    /// Other failures need the body and are left to [`Self::error_from_body`].
    fn error_for_status(status: StatusCode) -> Option<MarketDataError> {
        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
                Some(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED => Some(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Invalid or missing API key".to_string(),
            }),
            _ => None,
        }
    }

    /// Build an error from a non-success response body.
    fn error_from_body(status: StatusCode, body: &str) -> MarketDataError {
        if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(body) {
            if let Some(error_msg) = error_resp.error {
                return MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: error_msg,
                };
            }
        }

        MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("HTTP {} - {}", status, body),
        }
    }

    fn to_decimal(value: Option<f64>) -> Option<Decimal> {
        value.and_then(|v| Decimal::try_from(v).ok())
    }

    /// Turn a /quote body into a quote.
    fn parse_quote(symbol: &str, body: &str) -> Result<Quote, MarketDataError> {
        let response: QuoteResponse =
            serde_json::from_str(body).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse quote response: {}", e),
            })?;

        let close = response
            .c
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        // Finnhub answers unknown symbols with an all-zero payload and no
        // timestamp. A zero price with a real timestamp is still a price.
        let has_timestamp = response.t.map_or(false, |t| t > 0);
        if !has_timestamp && close == 0.0 && response.pc.unwrap_or(0.0) == 0.0 {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }

        let price = Decimal::try_from(close).map_err(|_| MarketDataError::ValidationFailed {
            message: format!("Invalid current price: {}", close),
        })?;

        let timestamp = response
            .t
            .filter(|t| *t > 0)
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            previous_close: Self::to_decimal(response.pc),
            change: Self::to_decimal(response.d),
            change_percent: Self::to_decimal(response.dp),
            timestamp,
            source: PROVIDER_ID.to_string(),
        })
    }
}

// ============================================================================
// QuoteProvider Implementation
// ============================================================================

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            backoff_base: Duration::from_secs(5), // 5s, then 10s
            min_delay: Duration::from_secs(1),
        }
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        debug!("Fetching latest quote for {} from Finnhub", symbol);
        let body = self.fetch("/quote", &[("symbol", symbol)]).await?;
        Self::parse_quote(symbol, &body)
    }
}
