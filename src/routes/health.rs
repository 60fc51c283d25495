use axum::{routing::get, Json, Router};
use tracing::info;

use crate::models::HealthResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health() -> Json<HealthResponse> {
    info!("GET /health - Health check");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Stock prediction server is running".to_string(),
    })
}
