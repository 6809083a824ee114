use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use quotegate_market_data::{PriceQuote, TickerQuote};

async fn get_price(
    Path(ticker): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PriceQuote>> {
    let price = state.gateway.get_quote(&ticker).await?;
    Ok(Json(price))
}

/// Quotes for a comma-separated list. Tickers that failed are left out of the
/// response and only logged, unless all of them failed.
async fn get_tickers(
    Path(tickers): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TickerQuote>>> {
    let batch = state.gateway.get_quotes(&tickers).await?;
    if !batch.failed.is_empty() {
        tracing::info!(failed = ?batch.failed, "partial batch");
    }
    Ok(Json(batch.quotes))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/price/{ticker}", get(get_price))
        .route("/tickers/{tickers}", get(get_tickers))
}
