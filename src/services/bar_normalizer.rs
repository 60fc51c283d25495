use chrono::{DateTime, NaiveDate};

use crate::errors::AppError;
use crate::models::DailyBar;

/// Column-oriented daily bars as the chart provider returns them.
///
/// Every quote column is optional because the provider omits whole columns
/// on some failures; a missing column is reported as malformed data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBarColumns {
    pub timestamps: Vec<i64>,
    pub open: Option<Vec<Option<f64>>>,
    pub high: Option<Vec<Option<f64>>>,
    pub low: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
    pub volume: Option<Vec<Option<f64>>>,
}

/// Converts provider columns into bars, dropping every bar without a finite close.
///
/// Upstream order is kept as is; the provider delivers ascending timestamps.
pub fn normalize(columns: RawBarColumns) -> Result<Vec<DailyBar>, AppError> {
    let n = columns.timestamps.len();

    let open = require_column("open", columns.open, n)?;
    let high = require_column("high", columns.high, n)?;
    let low = require_column("low", columns.low, n)?;
    let close = require_column("close", columns.close, n)?;
    let volume = require_column("volume", columns.volume, n)?;

    let mut bars = Vec::with_capacity(n);

    for (i, &ts) in columns.timestamps.iter().enumerate() {
        let date = civil_date(ts)?;

        // skip missing closes
        let Some(close) = close[i].filter(|c| c.is_finite()) else {
            continue;
        };

        bars.push(DailyBar {
            date,
            open: open[i],
            high: high[i],
            low: low[i],
            close,
            volume: volume[i],
            adj_close: Some(close),
        });
    }

    Ok(bars)
}

/// Re-applies the close filter to bars that are already in row form.
pub fn normalize_bars(bars: Vec<DailyBar>) -> Vec<DailyBar> {
    bars.into_iter().filter(DailyBar::has_valid_close).collect()
}

/// UTC calendar date of a Unix epoch second.
pub fn civil_date(timestamp: i64) -> Result<NaiveDate, AppError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| AppError::MalformedUpstreamData(format!("invalid timestamp: {timestamp}")))
}

fn require_column<T>(name: &str, column: Option<Vec<T>>, expected: usize) -> Result<Vec<T>, AppError> {
    let column = column
        .ok_or_else(|| AppError::MalformedUpstreamData(format!("missing {name} series")))?;

    if column.len() != expected {
        return Err(AppError::MalformedUpstreamData(format!(
            "{name} series has {} entries but there are {expected} timestamps",
            column.len()
        )));
    }

    Ok(column)
}
