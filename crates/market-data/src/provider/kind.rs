use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::errors::MarketDataError;

use super::alpha_vantage::AlphaVantageProvider;
use super::finnhub::FinnhubProvider;
use super::traits::QuoteProvider;
use super::unconfigured::UnconfiguredProvider;
use super::yahoo::YahooProvider;

/// The upstream a gateway talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    AlphaVantage,
    Finnhub,
    Yahoo,
}

impl ProviderKind {
    /// Provider identifier, matching [`QuoteProvider::id`].
    pub fn id(&self) -> &'static str {
        match self {
            Self::AlphaVantage => "ALPHA_VANTAGE",
            Self::Finnhub => "FINNHUB",
            Self::Yahoo => "YAHOO",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::AlphaVantage => Some("ALPHA_VANTAGE_API_KEY"),
            Self::Finnhub => Some("FINNHUB_API_KEY"),
            Self::Yahoo => None,
        }
    }

    /// Build the provider.
    ///
    /// A provider whose key is missing is still built, as an
    /// [`UnconfiguredProvider`] that reports the missing key on every call,
    /// so the server can start and answer with a configuration error.
    pub fn build(
        &self,
        api_key: Option<String>,
    ) -> Result<Arc<dyn QuoteProvider>, MarketDataError> {
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        let provider: Arc<dyn QuoteProvider> = match (self, api_key) {
            (Self::Yahoo, _) => Arc::new(YahooProvider::new()?),
            (Self::AlphaVantage, Some(key)) => Arc::new(AlphaVantageProvider::new(key)),
            (Self::Finnhub, Some(key)) => Arc::new(FinnhubProvider::new(key)),
            (kind, None) => {
                let env_var = kind.api_key_env().unwrap_or_default();
                warn!("{} is not set; {} requests will fail", env_var, kind);
                Arc::new(UnconfiguredProvider::new(kind.id(), env_var))
            }
        };

        Ok(provider)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "alpha_vantage" | "alphavantage" => Ok(Self::AlphaVantage),
            "finnhub" => Ok(Self::Finnhub),
            "yahoo" | "yahoo_finance" => Ok(Self::Yahoo),
            other => Err(MarketDataError::ProviderError {
                provider: other.to_string(),
                message: "unknown provider, expected alpha_vantage, finnhub or yahoo"
                    .to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(
            "alpha_vantage".parse::<ProviderKind>().unwrap(),
            ProviderKind::AlphaVantage
        );
        assert_eq!(
            "Alpha-Vantage".parse::<ProviderKind>().unwrap(),
            ProviderKind::AlphaVantage
        );
        assert_eq!(
            "FINNHUB".parse::<ProviderKind>().unwrap(),
            ProviderKind::Finnhub
        );
        assert_eq!(" yahoo ".parse::<ProviderKind>().unwrap(), ProviderKind::Yahoo);
        assert!("bloomberg".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_api_key_env() {
        assert_eq!(
            ProviderKind::AlphaVantage.api_key_env(),
            Some("ALPHA_VANTAGE_API_KEY")
        );
        assert_eq!(ProviderKind::Finnhub.api_key_env(), Some("FINNHUB_API_KEY"));
        assert_eq!(ProviderKind::Yahoo.api_key_env(), None);
    }

    #[test]
    fn test_build_with_key() {
        let provider = ProviderKind::Finnhub
            .build(Some("test_key".to_string()))
            .unwrap();
        assert_eq!(provider.id(), "FINNHUB");
    }

    #[tokio::test]
    async fn test_build_without_key_reports_missing_key() {
        let provider = ProviderKind::AlphaVantage.build(None).unwrap();
        assert_eq!(provider.id(), "ALPHA_VANTAGE");

        let err = provider.get_latest_quote("AAPL").await.unwrap_err();
        match err {
            MarketDataError::MissingApiKey { provider, env_var } => {
                assert_eq!(provider, "ALPHA_VANTAGE");
                assert_eq!(env_var, "ALPHA_VANTAGE_API_KEY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_blank_key_counts_as_missing() {
        let provider = ProviderKind::Finnhub.build(Some("  ".to_string())).unwrap();
        let err = provider.get_latest_quote("AAPL").await.unwrap_err();
        assert!(err.is_fatal());
    }
}
