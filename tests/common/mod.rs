#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use stockcast_backend::config::{AppConfig, HttpClientConfig};
use stockcast_backend::external::bar_provider::{BarProvider, ChartRange, ProviderError};
use stockcast_backend::external::prediction::{MockPredictionBackend, PredictionBackend};
use stockcast_backend::services::bar_normalizer::RawBarColumns;
use stockcast_backend::state::AppState;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const JAN_1_2012: i64 = 1_325_376_000;
pub const DAY: i64 = 86_400;

/// Serves `router` on an ephemeral localhost port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub fn fast_policy() -> HttpClientConfig {
    HttpClientConfig {
        timeout: Duration::from_secs(5),
        max_retries: 2,
        retry_base_delay: Duration::from_millis(1),
    }
}

pub fn base_config() -> AppConfig {
    let mut config = AppConfig::from_lookup(|_| None).unwrap();
    config.http = fast_policy();
    config
}

/// Columns for consecutive days starting 2012-01-01.
pub fn daily_columns(closes: &[Option<f64>]) -> RawBarColumns {
    let n = closes.len();
    RawBarColumns {
        timestamps: (0..n as i64).map(|i| JAN_1_2012 + i * DAY).collect(),
        open: Some(closes.to_vec()),
        high: Some(closes.iter().map(|c| c.map(|v| v + 1.0)).collect()),
        low: Some(closes.iter().map(|c| c.map(|v| v - 1.0)).collect()),
        close: Some(closes.to_vec()),
        volume: Some(vec![Some(1_000.0); n]),
    }
}

/// Bar provider answering every request with the same outcome.
pub struct FakeProvider {
    pub outcome: Box<dyn Fn() -> Result<RawBarColumns, ProviderError> + Send + Sync>,
}

impl FakeProvider {
    pub fn with_closes(closes: Vec<Option<f64>>) -> Self {
        Self {
            outcome: Box::new(move || Ok(daily_columns(&closes))),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            outcome: Box::new(move || Err(ProviderError::Status { status })),
        }
    }
}

#[async_trait]
impl BarProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_daily_bars(
        &self,
        _symbol: &str,
        _range: ChartRange,
    ) -> Result<RawBarColumns, ProviderError> {
        (self.outcome)()
    }
}

pub fn state_with(
    provider: impl BarProvider + 'static,
    backend: Arc<dyn PredictionBackend>,
) -> AppState {
    AppState {
        bar_provider: Arc::new(provider),
        prediction_backend: backend,
    }
}

pub fn mock_state(provider: impl BarProvider + 'static) -> AppState {
    state_with(provider, Arc::new(MockPredictionBackend))
}

/// Sends a request through the router without a network hop.
pub async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let resp = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
