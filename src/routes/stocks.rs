use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{
    FetchStockDataRequest, PredictStockRequest, PredictionResponse, StockDataResponse,
};
use crate::services::ingestion_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/fetch-stock-data", post(fetch_stock_data))
        .route("/predict-stock", post(predict_stock))
}

/// POST /api/fetch-stock-data
pub async fn fetch_stock_data(
    State(state): State<AppState>,
    payload: Result<Json<FetchStockDataRequest>, JsonRejection>,
) -> Result<Json<StockDataResponse>, AppError> {
    let Json(request) = payload?;
    info!("POST /fetch-stock-data - {:?}", request.symbol);

    ingestion_service::fetch_stock_data(state.bar_provider.as_ref(), request)
        .await
        .map(Json)
        .map_err(|e| {
            match &e {
                AppError::InvalidRequest(msg) => warn!("Rejected fetch-stock-data request: {}", msg),
                _ => error!("Error in fetch-stock-data: {}", e),
            }
            e
        })
}

/// POST /api/predict-stock
pub async fn predict_stock(
    State(state): State<AppState>,
    payload: Result<Json<PredictStockRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(request) = payload?;
    info!("POST /predict-stock - {:?}", request.symbol);

    ingestion_service::predict_stock(state.prediction_backend.as_ref(), request)
        .await
        .map(Json)
        .map_err(|e| {
            match &e {
                AppError::InvalidRequest(msg) => warn!("Rejected predict-stock request: {}", msg),
                _ => error!("Error in predict-stock: {}", e),
            }
            e
        })
}
