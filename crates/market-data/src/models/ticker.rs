use std::fmt;

use crate::errors::MarketDataError;

/// Longest ticker accepted from a client.
const MAX_TICKER_LEN: usize = 20;

/// Index symbols that upstream quote APIs cannot price directly, mapped to
/// the liquid ETF that tracks each of them.
pub const INDEX_PROXIES: &[(&str, &str)] = &[
    ("^DJI", "DIA"),
    ("^GSPC", "SPY"),
    ("^IXIC", "QQQ"),
    ("^RUT", "IWM"),
];

/// Returns the ETF proxy for a recognized index symbol.
///
/// The lookup expects an uppercased symbol.
pub fn index_proxy(symbol: &str) -> Option<&'static str> {
    INDEX_PROXIES
        .iter()
        .find(|(index, _)| *index == symbol)
        .map(|(_, etf)| *etf)
}

/// A validated ticker.
///
/// `symbol` is what the client asked for (uppercased) and is what responses
/// are reported under. `upstream` is what gets sent to the provider, which
/// differs only for index symbols.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ticker {
    symbol: String,
    upstream: String,
}

impl Ticker {
    /// Normalize and validate a raw ticker.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::InvalidTicker`] when the input is empty,
    /// too long, or contains characters no quote symbol uses.
    pub fn parse(raw: &str) -> Result<Self, MarketDataError> {
        let symbol = raw.trim().to_uppercase();

        if symbol.is_empty() {
            return Err(MarketDataError::InvalidTicker("empty ticker".to_string()));
        }
        if symbol.len() > MAX_TICKER_LEN {
            return Err(MarketDataError::InvalidTicker(format!(
                "{} exceeds {} characters",
                symbol, MAX_TICKER_LEN
            )));
        }
        if !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '^' | '.' | '-' | '=' | ':'))
        {
            return Err(MarketDataError::InvalidTicker(symbol));
        }

        let upstream = index_proxy(&symbol)
            .map(str::to_string)
            .unwrap_or_else(|| symbol.clone());

        Ok(Self { symbol, upstream })
    }

    /// The requested ticker, uppercased.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The symbol to query upstream.
    pub fn upstream_symbol(&self) -> &str {
        &self.upstream
    }

    /// Whether an ETF proxy stands in for this ticker upstream.
    pub fn is_proxied(&self) -> bool {
        self.symbol != self.upstream
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Parse a comma-separated ticker list.
///
/// Empty segments are skipped and duplicates collapse to their first
/// occurrence, so `"aapl, AAPL,,msft"` yields `[AAPL, MSFT]`.
///
/// # Errors
///
/// Fails on the first invalid segment, or when no ticker remains.
pub fn parse_ticker_list(raw: &str) -> Result<Vec<Ticker>, MarketDataError> {
    let mut tickers: Vec<Ticker> = Vec::new();

    for segment in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let ticker = Ticker::parse(segment)?;
        if !tickers.iter().any(|t| t.symbol == ticker.symbol) {
            tickers.push(ticker);
        }
    }

    if tickers.is_empty() {
        return Err(MarketDataError::InvalidTicker(
            "no tickers supplied".to_string(),
        ));
    }

    Ok(tickers)
}
