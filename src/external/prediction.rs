use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{AppConfig, HttpClientConfig, PredictionBackendConfig};
use crate::errors::AppError;
use crate::external::retry::{with_retry, Retryable};
use crate::models::{DailyBar, PredictionPoint};

pub const MOCK_PREDICTION_NOTE: &str = "Using mock predictions. Deploy your Python API and set \
     PYTHON_ML_API_URL env variable to get real predictions.";

/// Mock predictions scale the actual close by a factor drawn from this range.
pub const MOCK_FACTOR_RANGE: std::ops::RangeInclusive<f64> = 0.95..=1.05;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub predictions: Vec<PredictionPoint>,
    pub note: Option<String>,
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction backend unreachable: {0}")]
    Transport(String),

    #[error("prediction backend returned HTTP {0}")]
    Status(u16),

    #[error("prediction backend sent an unreadable body: {0}")]
    Decode(String),
}

impl Retryable for PredictionError {
    fn is_transient(&self) -> bool {
        match self {
            PredictionError::Transport(_) => true,
            PredictionError::Status(status) => *status == 429 || *status >= 500,
            PredictionError::Decode(_) => false,
        }
    }
}

impl From<PredictionError> for AppError {
    fn from(value: PredictionError) -> Self {
        match value {
            PredictionError::Status(_) => AppError::PredictionBackendError(
                "Failed to get predictions from ML model".to_string(),
            ),
            other => AppError::PredictionBackendError(other.to_string()),
        }
    }
}

/// Forecasting capability. The caller cannot tell the mock from a real backend.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn predict(
        &self,
        symbol: &str,
        bars: &[DailyBar],
    ) -> Result<PredictionOutcome, PredictionError>;
}

/// Used when no prediction backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockPredictionBackend;

#[async_trait]
impl PredictionBackend for MockPredictionBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn predict(
        &self,
        _symbol: &str,
        bars: &[DailyBar],
    ) -> Result<PredictionOutcome, PredictionError> {
        let mut rng = rand::rng();
        let predictions = bars
            .iter()
            .map(|bar| PredictionPoint {
                date: bar.date,
                actual: bar.close,
                predicted: bar.close * rng.random_range(MOCK_FACTOR_RANGE),
            })
            .collect();

        Ok(PredictionOutcome {
            predictions,
            note: Some(MOCK_PREDICTION_NOTE.to_string()),
        })
    }
}

#[derive(Debug, Serialize)]
struct RemotePredictionRequest<'a> {
    symbol: &'a str,
    data: &'a [DailyBar],
}

// Backends answer either with a bare list or wrapped with an optional note.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemotePredictionBody {
    Bare(Vec<PredictionPoint>),
    Wrapped {
        predictions: Vec<PredictionPoint>,
        #[serde(default)]
        note: Option<String>,
    },
}

/// HTTP client for an external forecasting service.
pub struct RemotePredictionBackend {
    client: reqwest::Client,
    config: PredictionBackendConfig,
    policy: HttpClientConfig,
}

impl RemotePredictionBackend {
    pub fn new(
        config: PredictionBackendConfig,
        policy: &HttpClientConfig,
    ) -> Result<Self, PredictionError> {
        let client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| PredictionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            policy: policy.clone(),
        })
    }

    async fn predict_once(
        &self,
        body: &RemotePredictionRequest<'_>,
    ) -> Result<PredictionOutcome, PredictionError> {
        let mut request = self.client.post(&self.config.url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| PredictionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            error!("Python API error: {}", status);
            return Err(PredictionError::Status(status.as_u16()));
        }

        let body = resp
            .json::<RemotePredictionBody>()
            .await
            .map_err(|e| PredictionError::Decode(e.to_string()))?;

        Ok(match body {
            RemotePredictionBody::Bare(predictions) => PredictionOutcome {
                predictions,
                note: None,
            },
            RemotePredictionBody::Wrapped { predictions, note } => {
                PredictionOutcome { predictions, note }
            }
        })
    }
}

#[async_trait]
impl PredictionBackend for RemotePredictionBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn predict(
        &self,
        symbol: &str,
        bars: &[DailyBar],
    ) -> Result<PredictionOutcome, PredictionError> {
        let body = RemotePredictionRequest { symbol, data: bars };
        let body = &body;
        let label = format!("Prediction request for {symbol}");

        let outcome = with_retry(&self.policy, &label, move || self.predict_once(body)).await?;
        info!("Successfully received predictions for {}", symbol);
        Ok(outcome)
    }
}

/// Picks the remote backend when one is configured, otherwise the mock.
pub fn backend_from_config(config: &AppConfig) -> Result<Arc<dyn PredictionBackend>, PredictionError> {
    match &config.prediction_backend {
        Some(backend) => {
            info!("🤖 Using prediction backend at {}", backend.url);
            Ok(Arc::new(RemotePredictionBackend::new(
                backend.clone(),
                &config.http,
            )?))
        }
        None => {
            warn!("PYTHON_ML_API_URL not configured, using mock predictions");
            Ok(Arc::new(MockPredictionBackend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
            adj_close: Some(close),
        }
    }

    #[tokio::test]
    async fn mock_predictions_stay_within_five_percent() {
        let bars: Vec<DailyBar> = (1..=28).map(|d| bar(d, 100.0)).collect();
        let outcome = MockPredictionBackend.predict("AAPL", &bars).await.unwrap();

        assert_eq!(outcome.predictions.len(), bars.len());
        for (p, b) in outcome.predictions.iter().zip(&bars) {
            assert_eq!(p.date, b.date);
            assert_eq!(p.actual, 100.0);
            assert!((95.0..=105.0).contains(&p.predicted), "{} out of range", p.predicted);
        }
        assert!(outcome.note.is_some_and(|n| !n.is_empty()));
    }

    #[tokio::test]
    async fn mock_handles_empty_input() {
        let outcome = MockPredictionBackend.predict("AAPL", &[]).await.unwrap();
        assert!(outcome.predictions.is_empty());
    }

    #[test]
    fn remote_body_accepts_both_shapes() {
        let bare: RemotePredictionBody = serde_json::from_str(
            r#"[{"date":"2020-01-01","actual":1.0,"predicted":1.1}]"#,
        )
        .unwrap();
        assert!(matches!(bare, RemotePredictionBody::Bare(p) if p.len() == 1));

        let wrapped: RemotePredictionBody = serde_json::from_str(
            r#"{"predictions":[],"note":"model v2"}"#,
        )
        .unwrap();
        assert!(
            matches!(wrapped, RemotePredictionBody::Wrapped { note: Some(n), .. } if n == "model v2")
        );
    }

    #[test]
    fn backend_status_maps_to_prediction_error() {
        let err: AppError = PredictionError::Status(502).into();
        assert_eq!(err.to_string(), "Failed to get predictions from ML model");
        assert_eq!(err.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
