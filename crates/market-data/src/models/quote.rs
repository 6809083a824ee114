use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ticker::Ticker;

/// Decimal places kept in every payload sent to clients.
const PAYLOAD_DP: u32 = 2;

/// `change` as a percentage of `base`, or `None` when `base` is zero or the
/// result does not fit in a `Decimal`.
fn percent_of(change: Decimal, base: Decimal) -> Option<Decimal> {
    change
        .checked_div(base)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Provider-normalized quote snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol as queried upstream
    pub symbol: String,

    /// Current (last traded) price
    pub price: Decimal,

    /// Previous session close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    /// Absolute change against the previous close, as reported upstream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Percent change against the previous close, as reported upstream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,

    /// Time of the quote
    pub timestamp: DateTime<Utc>,

    /// Source of the quote (ALPHA_VANTAGE, FINNHUB, YAHOO)
    pub source: String,
}

impl Quote {
    /// Create a quote with only the required fields
    pub fn new(symbol: String, price: Decimal, timestamp: DateTime<Utc>, source: String) -> Self {
        Self {
            symbol,
            price,
            previous_close: None,
            change: None,
            change_percent: None,
            timestamp,
            source,
        }
    }

    /// Set the previous close
    pub fn with_previous_close(mut self, previous_close: Decimal) -> Self {
        self.previous_close = Some(previous_close);
        self
    }

    /// Absolute change, derived from the previous close when upstream omits it.
    pub fn effective_change(&self) -> Option<Decimal> {
        self.change
            .or_else(|| self.price.checked_sub(self.previous_close?))
    }

    /// Percent change, derived from the change and a nonzero previous close
    /// when upstream omits it.
    pub fn effective_change_percent(&self) -> Option<Decimal> {
        self.change_percent
            .or_else(|| percent_of(self.effective_change()?, self.previous_close?))
    }
}

/// Single-ticker price payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
    pub ticker: String,
    pub current_price: Decimal,
    pub previous_close: Option<Decimal>,
    pub price_change: Option<Decimal>,
    pub price_change_percent: Option<Decimal>,
}

impl PriceQuote {
    /// Shape an upstream quote for the client, reported under the requested
    /// ticker rather than the upstream symbol.
    pub fn from_quote(ticker: &Ticker, quote: &Quote) -> Self {
        Self {
            ticker: ticker.symbol().to_string(),
            current_price: quote.price.round_dp(PAYLOAD_DP),
            previous_close: quote.previous_close.map(|p| p.round_dp(PAYLOAD_DP)),
            price_change: quote.effective_change().map(|c| c.round_dp(PAYLOAD_DP)),
            price_change_percent: quote
                .effective_change_percent()
                .map(|p| p.round_dp(PAYLOAD_DP)),
        }
    }
}

/// Price movement between two observations of the same ticker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn between(previous: Decimal, current: Decimal) -> Self {
        match current.cmp(&previous) {
            std::cmp::Ordering::Greater => Self::Up,
            std::cmp::Ordering::Less => Self::Down,
            std::cmp::Ordering::Equal => Self::Flat,
        }
    }
}

/// One entry of a batch response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TickerQuote {
    pub ticker: String,
    pub current_price: Decimal,
    pub price_change: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_change: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl TickerQuote {
    /// Build a batch entry from a fresh quote and the price last seen for the
    /// same ticker, if any.
    pub fn from_observation(ticker: &Ticker, quote: &Quote, last_seen: Option<Decimal>) -> Self {
        let price_change = last_seen.map(|prev| Direction::between(prev, quote.price));
        let percentage_change = last_seen
            .and_then(|prev| percent_of(quote.price.checked_sub(prev)?, prev))
            .map(|pct| pct.round_dp(PAYLOAD_DP));

        Self {
            ticker: ticker.symbol().to_string(),
            current_price: quote.price.round_dp(PAYLOAD_DP),
            price_change,
            percentage_change,
            timestamp: quote.timestamp,
        }
    }
}

/// Result of a batch lookup: the tickers that resolved and the ones that did
/// not, both in request order.
#[derive(Clone, Debug, Default)]
pub struct BatchQuotes {
    pub quotes: Vec<TickerQuote>,
    pub failed: Vec<String>,
}
