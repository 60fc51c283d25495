use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::config::HttpClientConfig;
use crate::errors::AppError;
use crate::external::retry::{with_retry, Retryable};
use crate::models::{DailyBar, PredictionResponse, StockDataResponse};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch stock data";
pub const PREDICT_FAILED_MESSAGE: &str = "Failed to get predictions";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with an error status; `message` is its `{error}` text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unreadable response: {0}")]
    Decode(String),

    #[error("{0}")]
    NoData(String),

    #[error(transparent)]
    Pipeline(#[from] AppError),
}

impl Retryable for GatewayError {
    fn is_transient(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Api { status, .. } => *status == 429 || *status >= 502,
            _ => false,
        }
    }
}

/// Access to the stock API, independent of how the backend is deployed.
#[async_trait]
pub trait DataGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_stock_data(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<StockDataResponse, GatewayError>;

    async fn predict_stock(
        &self,
        symbol: &str,
        bars: &[DailyBar],
    ) -> Result<PredictionResponse, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub(crate) fn build_client(policy: &HttpClientConfig) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(policy.timeout)
        .build()
        .map_err(|e| GatewayError::Transport(e.to_string()))
}

/// Sends a prepared JSON request, retrying transient failures, and decodes
/// either the success body or the backend's `{error}` message.
pub(crate) async fn send_json<T, F>(
    policy: &HttpClientConfig,
    label: &str,
    fallback_message: &str,
    make_request: F,
) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let make_request = &make_request;
    with_retry(policy, label, move || async move {
        let resp = make_request()
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| fallback_message.to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    })
    .await
}
