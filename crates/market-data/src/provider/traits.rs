//! Quote provider trait definitions.
//!
//! This module defines the core `QuoteProvider` trait that all
//! upstream quote sources implement.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::Quote;

use super::capabilities::RateLimit;

/// Trait for upstream quote providers.
///
/// Implement this trait to add support for a new quote source. A provider
/// makes exactly one upstream call per `get_latest_quote`; retries, pacing
/// and caching belong to the gateway.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quotegate_market_data::provider::{QuoteProvider, RateLimit};
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     // ... implement get_latest_quote
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "ALPHA_VANTAGE", "FINNHUB", etc.
    /// Used for logging and error reporting.
    fn id(&self) -> &'static str;

    /// Rate limiting configuration.
    ///
    /// The gateway derives its default backoff and batch pacing from it.
    fn rate_limit(&self) -> RateLimit;

    /// Fetch the latest quote for an upstream symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The symbol as the provider knows it (index proxies already applied)
    ///
    /// # Returns
    ///
    /// The latest quote on success, or a `MarketDataError` on failure.
    /// Rate limiting must surface as [`MarketDataError::RateLimited`] so the
    /// gateway can back off.
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
}
