use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::client::gateway::{DataGateway, GatewayError};
use crate::models::{AlignedRow, PriceSeries};
use crate::services::bar_normalizer::normalize_bars;
use crate::services::{moving_average, series_aligner};

pub const SYMBOL_MISSING_MESSAGE: &str = "Please enter a stock symbol";
pub const NO_DATA_MESSAGE: &str = "No data available for this stock symbol";

#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub symbol: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub windows: Vec<usize>,
}

/// Everything the price, moving-average and prediction charts need.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub symbol: String,
    pub bar_count: usize,
    pub windows: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub rows: Vec<AlignedRow>,
}

/// Fetches bars, asks for predictions, then derives and aligns the chart series.
pub async fn load_dashboard(
    gateway: &dyn DataGateway,
    request: &DashboardRequest,
) -> Result<Dashboard, GatewayError> {
    let symbol = request.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(GatewayError::InvalidInput(SYMBOL_MISSING_MESSAGE.to_string()));
    }
    if let Some(bad) = request.windows.iter().find(|&&w| w == 0) {
        return Err(GatewayError::InvalidInput(format!(
            "moving average window must be positive, got {bad}"
        )));
    }

    let stock = gateway
        .fetch_stock_data(&symbol, request.start, request.end)
        .await?;
    let bars = normalize_bars(stock.data);
    if bars.is_empty() {
        return Err(GatewayError::NoData(NO_DATA_MESSAGE.to_string()));
    }
    info!("Loaded {} days of data for {} via {}", bars.len(), symbol, gateway.name());

    let prediction = gateway.predict_stock(&symbol, &bars).await?;

    let prices = PriceSeries::from_bars(&bars);
    let averages = moving_average::moving_averages(&prices, &request.windows)?;
    let rows = series_aligner::align(&prices, &averages, Some(prediction.predictions.as_slice()));

    Ok(Dashboard {
        symbol: stock.symbol,
        bar_count: bars.len(),
        windows: request.windows.clone(),
        note: prediction.note,
        rows,
    })
}
