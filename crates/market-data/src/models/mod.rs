//! Quote models
//!
//! This module contains the core data types for quote operations:
//! - `ticker` - Validated ticker symbols and index-to-ETF proxy mapping
//! - `quote` - Upstream quote snapshots and the payloads built from them

mod quote;
mod ticker;

pub use quote::{BatchQuotes, Direction, PriceQuote, Quote, TickerQuote};
pub use ticker::{index_proxy, parse_ticker_list, Ticker, INDEX_PROXIES};
