//! Quote Gateway market data crate.
//!
//! Fetches current stock prices from one upstream provider and shapes them
//! for the HTTP layer.
//!
//! # Overview
//!
//! - Providers: Alpha Vantage, Finnhub, Yahoo Finance
//! - Ticker validation and index-to-ETF substitution
//! - Retry with exponential backoff on rate limiting
//! - Up/down/flat tracking against the last price seen per ticker
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   QuoteGateway   |  (validation, caches, pacing)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   RetryPolicy    |  (AttemptOutcome per call)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  QuoteProvider   |  (Alpha Vantage, Finnhub, Yahoo)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Ticker`] - Validated ticker with its upstream symbol
//! - [`Quote`] - Provider-normalized quote
//! - [`PriceQuote`] - Single-ticker payload
//! - [`TickerQuote`] - Batch entry with direction of movement
//! - [`MarketDataError`] - Every failure a lookup can produce

pub mod errors;
pub mod gateway;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};

pub use gateway::{
    AttemptOutcome, LastPriceCache, QuoteGateway, ResponseCache, RetryPolicy,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PRICE_CACHE_TTL,
};

pub use models::{
    index_proxy, parse_ticker_list, BatchQuotes, Direction, PriceQuote, Quote, Ticker,
    TickerQuote, INDEX_PROXIES,
};

pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{ProviderKind, QuoteProvider, RateLimit, UnconfiguredProvider};
