use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use quotegate_market_data::{ProviderKind, DEFAULT_MAX_ATTEMPTS, DEFAULT_PRICE_CACHE_TTL};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CORS_ORIGINS: &str = "https://financecalculate.com";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub provider: ProviderKind,
    /// Key for the selected provider, if it needs one and it is set.
    pub api_key: Option<String>,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub price_cache_ttl: Duration,
    pub max_attempts: u32,
    /// Overrides the provider's backoff base.
    pub backoff_base: Option<Duration>,
    /// Overrides the provider's pacing between batch calls.
    pub batch_pacing: Option<Duration>,
}

impl Config {
    /// Load configuration from the process environment, after reading `.env`
    /// if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = parse_var(&lookup, "QG_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?;
        let provider: ProviderKind = parse_var(&lookup, "QG_PROVIDER", "alpha_vantage")?;
        let api_key = provider
            .api_key_env()
            .and_then(|name| lookup(name))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let cors_allow = lookup("QG_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = parse_var(
            &lookup,
            "QG_REQUEST_TIMEOUT_MS",
            &DEFAULT_REQUEST_TIMEOUT_MS.to_string(),
        )?;
        let cache_ttl_secs: u64 = parse_var(
            &lookup,
            "QG_PRICE_CACHE_TTL_SECS",
            &DEFAULT_PRICE_CACHE_TTL.as_secs().to_string(),
        )?;
        let max_attempts: u32 =
            parse_var(&lookup, "QG_MAX_ATTEMPTS", &DEFAULT_MAX_ATTEMPTS.to_string())?;
        if max_attempts == 0 {
            anyhow::bail!("QG_MAX_ATTEMPTS must be at least 1");
        }
        let backoff_base = parse_millis(&lookup, "QG_BACKOFF_BASE_MS")?;
        let batch_pacing = parse_millis(&lookup, "QG_BATCH_PACING_MS")?;

        Ok(Self {
            listen_addr,
            provider,
            api_key,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            price_cache_ttl: Duration::from_secs(cache_ttl_secs),
            max_attempts,
            backoff_base,
            batch_pacing,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid {name}: {raw}"))
}

fn parse_millis<F>(lookup: &F, name: &str) -> anyhow::Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .with_context(|| format!("Invalid {name}: {raw}"))
        })
        .transpose()
}
