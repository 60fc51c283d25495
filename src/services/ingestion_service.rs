use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::info;

use crate::errors::AppError;
use crate::external::bar_provider::{BarProvider, ChartRange};
use crate::external::prediction::PredictionBackend;
use crate::models::{
    FetchStockDataRequest, PredictStockRequest, PredictionResponse, StockDataResponse,
};
use crate::services::bar_normalizer;

pub const SYMBOL_REQUIRED: &str = "Stock symbol is required";
pub const SYMBOL_AND_DATA_REQUIRED: &str = "Stock symbol and data are required";

/// First day requested when the caller gives no start date.
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Resolves optional `YYYY-MM-DD` bounds into the provider's Unix-second range.
///
/// Both bounds are taken at midnight UTC; without an end date the range ends
/// at `now`.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ChartRange, AppError> {
    let start_date = match parse_date("startDate", start)? {
        Some(d) => d,
        None => default_start_date(),
    };
    let period1 = start_date.and_time(NaiveTime::MIN).and_utc().timestamp();

    let period2 = match parse_date("endDate", end)? {
        Some(end_date) => {
            if end_date < start_date {
                return Err(AppError::InvalidRequest(format!(
                    "endDate {end_date} is before startDate {start_date}"
                )));
            }
            end_date.and_time(NaiveTime::MIN).and_utc().timestamp()
        }
        None => now.timestamp(),
    };

    Ok(ChartRange { period1, period2 })
}

// Empty strings count as "not given".
fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
            AppError::InvalidRequest(format!("{field} must be a date in YYYY-MM-DD format"))
        }),
    }
}

fn required_symbol(symbol: Option<&str>) -> Option<&str> {
    symbol.map(str::trim).filter(|s| !s.is_empty())
}

pub async fn fetch_stock_data(
    provider: &dyn BarProvider,
    request: FetchStockDataRequest,
) -> Result<StockDataResponse, AppError> {
    let symbol = required_symbol(request.symbol.as_deref())
        .ok_or_else(|| AppError::InvalidRequest(SYMBOL_REQUIRED.to_string()))?;

    info!(
        "Fetching stock data for {} from {:?} to {:?}",
        symbol, request.start_date, request.end_date
    );

    let range = resolve_range(
        request.start_date.as_deref(),
        request.end_date.as_deref(),
        Utc::now(),
    )?;

    let columns = provider.fetch_daily_bars(symbol, range).await?;
    let data = bar_normalizer::normalize(columns)?;

    info!(
        "Successfully fetched {} data points for {} from {}",
        data.len(),
        symbol,
        provider.name()
    );

    Ok(StockDataResponse {
        symbol: symbol.to_string(),
        data,
    })
}

pub async fn predict_stock(
    backend: &dyn PredictionBackend,
    request: PredictStockRequest,
) -> Result<PredictionResponse, AppError> {
    let (Some(symbol), Some(bars)) = (
        required_symbol(request.symbol.as_deref()),
        request.stock_data.as_deref(),
    ) else {
        return Err(AppError::InvalidRequest(SYMBOL_AND_DATA_REQUIRED.to_string()));
    };

    info!(
        "Making prediction for {} with {} data points using {} backend",
        symbol,
        bars.len(),
        backend.name()
    );

    let outcome = backend.predict(symbol, bars).await?;

    Ok(PredictionResponse {
        symbol: symbol.to_string(),
        predictions: outcome.predictions,
        note: outcome.note,
    })
}
