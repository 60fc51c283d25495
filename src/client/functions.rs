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

/// Talks to the serverless deployment, where each endpoint is a separate
/// function under `/functions/v1/` guarded by the project's anon key.
pub struct FunctionsGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    policy: HttpClientConfig,
}

impl FunctionsGateway {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        policy: &HttpClientConfig,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(policy)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            policy: policy.clone(),
        })
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    fn invoke<B: serde::Serialize>(&self, url: &str, body: &B) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(body)
    }
}

#[async_trait]
impl DataGateway for FunctionsGateway {
    fn name(&self) -> &'static str {
        "functions"
    }

    async fn fetch_stock_data(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<StockDataResponse, GatewayError> {
        let url = self.function_url("fetch-stock-data");
        let body = FetchStockDataRequest {
            symbol: Some(symbol.to_string()),
            start_date: start.map(|d| d.to_string()),
            end_date: end.map(|d| d.to_string()),
        };

        send_json(&self.policy, "fetch-stock-data function", FETCH_FAILED_MESSAGE, || {
            self.invoke(&url, &body)
        })
        .await
    }

    async fn predict_stock(
        &self,
        symbol: &str,
        bars: &[DailyBar],
    ) -> Result<PredictionResponse, GatewayError> {
        let url = self.function_url("predict-stock");
        let body = PredictStockRequest {
            symbol: Some(symbol.to_string()),
            stock_data: Some(bars.to_vec()),
        };

        send_json(&self.policy, "predict-stock function", PREDICT_FAILED_MESSAGE, || {
            self.invoke(&url, &body)
        })
        .await
    }
}
