use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::{QuoteProvider, RateLimit};

/// Placeholder for a provider whose API key is missing.
///
/// Every call fails with [`MarketDataError::MissingApiKey`] without touching
/// the network.
pub struct UnconfiguredProvider {
    id: &'static str,
    env_var: &'static str,
}

impl UnconfiguredProvider {
    pub fn new(id: &'static str, env_var: &'static str) -> Self {
        Self { id, env_var }
    }
}

#[async_trait]
impl QuoteProvider for UnconfiguredProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    async fn get_latest_quote(&self, _symbol: &str) -> Result<Quote, MarketDataError> {
        Err(MarketDataError::MissingApiKey {
            provider: self.id.to_string(),
            env_var: self.env_var.to_string(),
        })
    }
}
