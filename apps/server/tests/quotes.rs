use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use quotegate_market_data::{
    MarketDataError, ProviderKind, Quote, QuoteProvider, RateLimit,
};
use quotegate_server::{api::app_router, build_state, build_state_with_provider, config::Config};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

/// Provider serving fixed prices; unknown symbols are not found, `LIMIT` is
/// always rate limited, `TINY` has a near-zero previous close and `CRASH`
/// panics.
struct StubProvider {
    prices: Mutex<HashMap<String, Vec<Decimal>>>,
}

impl StubProvider {
    fn new(prices: &[(&str, &[Decimal])]) -> Arc<Self> {
        let prices = prices
            .iter()
            .map(|(symbol, seq)| (symbol.to_string(), seq.to_vec()))
            .collect();
        Arc::new(Self {
            prices: Mutex::new(prices),
        })
    }
}

#[async_trait]
impl QuoteProvider for StubProvider {
    fn id(&self) -> &'static str {
        "STUB"
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            backoff_base: Duration::ZERO,
            min_delay: Duration::ZERO,
        }
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        if symbol == "LIMIT" {
            return Err(MarketDataError::RateLimited {
                provider: "STUB".to_string(),
            });
        }

        if symbol == "CRASH" {
            panic!("upstream payload could not be handled");
        }
        if symbol == "TINY" {
            return Ok(
                Quote::new(symbol.to_string(), dec!(1), Utc::now(), "STUB".to_string())
                    .with_previous_close(Decimal::new(1, 28)),
            );
        }

        let mut prices = self.prices.lock().unwrap();
        let seq = prices
            .get_mut(symbol)
            .filter(|seq| !seq.is_empty())
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
        let price = if seq.len() > 1 { seq.remove(0) } else { seq[0] };

        Ok(
            Quote::new(symbol.to_string(), price, Utc::now(), "STUB".to_string())
                .with_previous_close(dec!(100)),
        )
    }
}

fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("QG_CORS_ALLOW_ORIGINS", "https://financecalculate.com"),
        ("QG_PRICE_CACHE_TTL_SECS", "0"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
}

fn app(provider: Arc<StubProvider>) -> Router {
    let config = test_config();
    let state = build_state_with_provider(&config, provider);
    app_router(state, &config).unwrap()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn healthz_works() {
    let app = app(StubProvider::new(&[]));
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn price_returns_rounded_payload() {
    let app = app(StubProvider::new(&[("AAPL", &[dec!(101.256)])]));

    let (status, body) = get(&app, "/price/aapl").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["current_price"], 101.26);
    assert_eq!(body["previous_close"], 100.0);
    assert_eq!(body["price_change"], 1.26);
    assert_eq!(body["price_change_percent"], 1.26);
}

#[tokio::test]
async fn price_for_index_is_reported_under_index() {
    let app = app(StubProvider::new(&[("SPY", &[dec!(500)])]));

    let (status, body) = get(&app, "/price/%5EGSPC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "^GSPC");
    assert_eq!(body["current_price"], 500.0);
}

#[tokio::test]
async fn unknown_ticker_is_404() {
    let app = app(StubProvider::new(&[]));

    let (status, body) = get(&app, "/price/NOPE").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
    assert!(body.get("failed_tickers").is_none());
}

#[tokio::test]
async fn rate_limited_ticker_is_429() {
    let app = app(StubProvider::new(&[]));

    let (status, body) = get(&app, "/price/LIMIT").await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 429);
}

#[tokio::test]
async fn near_zero_previous_close_omits_percentage() {
    let app = app(StubProvider::new(&[]));

    let (status, body) = get(&app, "/price/TINY").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_price"], 1.0);
    assert!(body["price_change_percent"].is_null());
}

#[tokio::test]
async fn panicking_handler_is_500_with_error_body() {
    let app = app(StubProvider::new(&[]));

    let (status, body) = get(&app, "/price/CRASH").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 500);
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn invalid_ticker_is_400() {
    let app = app(StubProvider::new(&[]));

    let (status, body) = get(&app, "/price/A%20B").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = get(&app, "/tickers/AAPL,A%20B").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tickers_skip_failures_and_track_direction() {
    let app = app(StubProvider::new(&[("AAPL", &[dec!(100), dec!(110)])]));

    let (status, body) = get(&app, "/tickers/aapl,NOPE").await;
    assert_eq!(status, StatusCode::OK);
    let quotes = body.as_array().unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0]["ticker"], "AAPL");
    assert!(quotes[0]["price_change"].is_null());
    assert!(quotes[0]["timestamp"].is_string());

    let (status, body) = get(&app, "/tickers/AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["price_change"], "up");
    assert_eq!(body[0]["percentage_change"], 10.0);
}

#[tokio::test]
async fn all_failed_tickers_are_listed_in_404() {
    let app = app(StubProvider::new(&[]));

    let (status, body) = get(&app, "/tickers/NOPE,LIMIT").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["failed_tickers"],
        serde_json::json!(["NOPE", "LIMIT"])
    );
}

#[tokio::test]
async fn missing_api_key_is_500_for_both_endpoints() {
    let mut config = test_config();
    config.provider = ProviderKind::Finnhub;
    config.api_key = None;
    let state = build_state(&config).unwrap();
    let app = app_router(state, &config).unwrap();

    let (status, body) = get(&app, "/price/AAPL").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("FINNHUB_API_KEY"));

    let (status, _) = get(&app, "/tickers/AAPL,MSFT").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let app = app(StubProvider::new(&[]));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header(header::ORIGIN, "https://financecalculate.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://financecalculate.com"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header(header::ORIGIN, "https://elsewhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
