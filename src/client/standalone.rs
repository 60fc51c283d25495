use async_trait::async_trait;
use chrono::NaiveDate;

use crate::client::gateway::{
    build_client, send_json, DataGateway, GatewayError, FETCH_FAILED_MESSAGE,
    PREDICT_FAILED_MESSAGE,
};
use crate::config::HttpClientConfig;
use crate::models::{
    DailyBar, FetchStockDataRequest, PredictStockRequest, PredictionResponse, StockDataResponse,
};

/// Talks to the standalone server, e.g. `http://localhost:3001/api`.
pub struct StandaloneGateway {
    client: reqwest::Client,
    base_url: String,
    policy: HttpClientConfig,
}

impl StandaloneGateway {
    pub fn new(base_url: &str, policy: &HttpClientConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(policy)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: policy.clone(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

#[async_trait]
impl DataGateway for StandaloneGateway {
    fn name(&self) -> &'static str {
        "standalone"
    }

    async fn fetch_stock_data(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<StockDataResponse, GatewayError> {
        let url = self.endpoint("fetch-stock-data");
        let body = FetchStockDataRequest {
            symbol: Some(symbol.to_string()),
            start_date: start.map(|d| d.to_string()),
            end_date: end.map(|d| d.to_string()),
        };

        send_json(&self.policy, "fetch-stock-data", FETCH_FAILED_MESSAGE, || {
            self.client.post(&url).json(&body)
        })
        .await
    }

    async fn predict_stock(
        &self,
        symbol: &str,
        bars: &[DailyBar],
    ) -> Result<PredictionResponse, GatewayError> {
        let url = self.endpoint("predict-stock");
        let body = PredictStockRequest {
            symbol: Some(symbol.to_string()),
            stock_data: Some(bars.to_vec()),
        };

        send_json(&self.policy, "predict-stock", PREDICT_FAILED_MESSAGE, || {
            self.client.post(&url).json(&body)
        })
        .await
    }
}
