use serde::{Deserialize, Serialize};

use super::{DailyBar, PredictionPoint};

// Request bodies keep every field optional so that a missing field is reported
// with our own message instead of a deserializer rejection.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStockDataRequest {
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDataResponse {
    pub symbol: String,
    pub data: Vec<DailyBar>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictStockRequest {
    pub symbol: Option<String>,
    pub stock_data: Option<Vec<DailyBar>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub symbol: String,
    pub predictions: Vec<PredictionPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
