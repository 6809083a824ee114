use std::sync::Arc;

use crate::config::Config;
use quotegate_market_data::{LastPriceCache, QuoteGateway, QuoteProvider, RetryPolicy};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub gateway: Arc<QuoteGateway>,
}

pub fn init_tracing() {
    let log_format = std::env::var("QG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let provider = config.provider.build(config.api_key.clone())?;
    tracing::info!("Quote provider in use: {}", provider.id());
    Ok(build_state_with_provider(config, provider))
}

/// Wire the gateway around an already built provider.
pub fn build_state_with_provider(
    config: &Config,
    provider: Arc<dyn QuoteProvider>,
) -> Arc<AppState> {
    let limit = provider.rate_limit();
    let backoff_base = config.backoff_base.unwrap_or(limit.backoff_base);
    let pacing = config.batch_pacing.unwrap_or(limit.min_delay);

    let gateway = QuoteGateway::new(provider, Arc::new(LastPriceCache::new()))
        .with_retry_policy(RetryPolicy::new(config.max_attempts, backoff_base))
        .with_pacing(pacing)
        .with_price_cache_ttl(config.price_cache_ttl);

    tracing::debug!(
        max_attempts = config.max_attempts,
        backoff_ms = backoff_base.as_millis() as u64,
        pacing_ms = pacing.as_millis() as u64,
        cache_ttl_secs = config.price_cache_ttl.as_secs(),
        "quote gateway configured"
    );

    Arc::new(AppState {
        gateway: Arc::new(gateway),
    })
}
