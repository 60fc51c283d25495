use async_trait::async_trait;
use thiserror::Error;

use crate::errors::AppError;
use crate::external::retry::Retryable;
use crate::services::bar_normalizer::RawBarColumns;

pub const VERIFY_SYMBOL_MESSAGE: &str =
    "Failed to fetch stock data from Yahoo Finance. Please verify the stock symbol.";

/// Unix-second range handed to the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRange {
    pub period1: i64,
    pub period2: i64,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    /// The provider itself is misconfigured, e.g. an unusable base URL.
    #[error("invalid provider configuration: {0}")]
    Config(String),
}

impl Retryable for ProviderError {
    fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::Status { status } => *status == 429 || *status >= 500,
            ProviderError::Parse(_) | ProviderError::BadResponse(_) | ProviderError::Config(_) => {
                false
            }
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::Status { status } => AppError::UpstreamUnavailable {
                status: Some(status),
                message: VERIFY_SYMBOL_MESSAGE.to_string(),
            },
            ProviderError::Network(msg) => AppError::UpstreamUnavailable {
                status: None,
                message: format!("Yahoo Finance is unreachable: {msg}"),
            },
            ProviderError::Parse(msg) | ProviderError::BadResponse(msg) => {
                AppError::MalformedUpstreamData(msg)
            }
            ProviderError::Config(msg) => AppError::Internal(msg),
        }
    }
}

/// Source of daily bars for a symbol.
#[async_trait]
pub trait BarProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: ChartRange,
    ) -> Result<RawBarColumns, ProviderError>;
}
