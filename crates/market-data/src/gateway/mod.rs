//! Quote lookups on top of a provider.
//!
//! The gateway validates tickers, substitutes index proxies, retries rate
//! limited calls, paces batches, and tracks the last price seen per ticker.

mod last_price;
mod quote_gateway;
mod response_cache;
mod retry;

pub use last_price::LastPriceCache;
pub use quote_gateway::QuoteGateway;
pub use response_cache::{ResponseCache, DEFAULT_PRICE_CACHE_TTL};
pub use retry::{AttemptOutcome, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
