use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quotegate_market_data::MarketDataError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_tickers: Option<Vec<String>>,
}

fn market_data_status(e: &MarketDataError) -> StatusCode {
    match e {
        MarketDataError::MissingApiKey { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        MarketDataError::SymbolNotFound(_) | MarketDataError::AllTickersFailed { .. } => {
            StatusCode::NOT_FOUND
        }
        MarketDataError::RateLimited { .. } | MarketDataError::RetriesExhausted { .. } => {
            StatusCode::TOO_MANY_REQUESTS
        }
        MarketDataError::InvalidTicker(_)
        | MarketDataError::Timeout { .. }
        | MarketDataError::ProviderError { .. }
        | MarketDataError::ValidationFailed { .. }
        | MarketDataError::Network(_) => StatusCode::BAD_REQUEST,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MarketData(e) => market_data_status(e),
            ApiError::Internal(_) | ApiError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let failed_tickers = match &self {
            ApiError::MarketData(MarketDataError::AllTickersFailed { tickers }) => {
                Some(tickers.clone())
            }
            _ => None,
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
            failed_tickers,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
