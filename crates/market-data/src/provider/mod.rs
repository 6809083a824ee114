//! Quote provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that all providers implement
//! - Rate limiting configuration (backoff base and batch pacing)
//! - `ProviderKind`, which selects and builds a provider from configuration
//! - Concrete provider implementations (Alpha Vantage, Finnhub, Yahoo)
//!
//! Providers make one upstream call per request and translate the upstream's
//! failure modes into [`MarketDataError`](crate::errors::MarketDataError)
//! variants. Retrying, pacing and caching live in the gateway.

mod capabilities;
mod kind;
mod traits;
mod unconfigured;

pub mod alpha_vantage;
pub mod finnhub;
pub mod yahoo;

// Re-exports
pub use capabilities::RateLimit;
pub use kind::ProviderKind;
pub use traits::QuoteProvider;
pub use unconfigured::UnconfiguredProvider;
