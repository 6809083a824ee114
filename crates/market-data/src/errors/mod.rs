//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all quote operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching and shaping quotes.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines whether the retry loop should try the upstream again.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The API key for the configured provider is not set.
    /// Fatal for the whole request, including batches.
    #[error("API key not configured: set {env_var} for {provider}")]
    MissingApiKey {
        /// The provider that needs the key
        provider: String,
        /// The environment variable that should hold it
        env_var: String,
    },

    /// The ticker failed validation before any upstream call.
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// The requested symbol was not found by the provider, or the provider
    /// returned an empty quote payload.
    #[error("Ticker not found or insufficient data: {0}")]
    SymbolNotFound(String),

    /// Every ticker of a batch request failed.
    #[error("No data for tickers: {}", tickers.join(", "))]
    AllTickersFailed {
        /// The failed tickers, in request order
        tickers: Vec<String>,
    },

    /// The provider rate limited the request (HTTP 429 or an equivalent body).
    /// Should retry with exponential backoff.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider kept rate limiting until the attempt budget ran out.
    #[error("Rate limit exceeded after {attempts} attempts: {provider}")]
    RetriesExhausted {
        /// The provider that rate limited the request
        provider: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider returned data that could not be turned into a quote.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// Only rate limiting is retried; every other failure is terminal for the
    /// ticker.
    ///
    /// # Examples
    ///
    /// ```
    /// use quotegate_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "FINNHUB".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::WithBackoff,

            Self::MissingApiKey { .. }
            | Self::InvalidTicker(_)
            | Self::SymbolNotFound(_)
            | Self::AllTickersFailed { .. }
            | Self::RetriesExhausted { .. }
            | Self::Timeout { .. }
            | Self::ProviderError { .. }
            | Self::ValidationFailed { .. }
            | Self::Network(_) => RetryClass::Never,
        }
    }

    /// Whether this error should abort a batch instead of failing one ticker.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingApiKey { .. })
    }
}
