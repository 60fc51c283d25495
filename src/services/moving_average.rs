use crate::errors::AppError;
use crate::models::{MovingAverageSeries, PriceSeries, SeriesPoint};

/// Simple Moving Average (SMA)
///
/// Returns a vector aligned with `values`:
/// - `None` for the first `window - 1` positions (not enough history)
/// - `Some(avg)` of the trailing `window` values afterwards
///
/// A window longer than the series yields only `None`.
pub fn sma(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, AppError> {
    if window == 0 {
        return Err(AppError::InvalidWindowSize(window));
    }

    // Running sum: add the newest value, subtract the one that falls out of the window.
    Ok(values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }

            let out = if i + 1 >= window {
                Some(*sum / window as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect())
}

pub fn moving_average(prices: &PriceSeries, window: usize) -> Result<MovingAverageSeries, AppError> {
    let values = sma(&prices.prices(), window)?;

    let points = prices
        .points()
        .iter()
        .zip(values)
        .map(|(p, value)| SeriesPoint {
            date: p.date,
            value,
        })
        .collect();

    Ok(MovingAverageSeries { window, points })
}

/// One series per window, in the order the windows were given.
pub fn moving_averages(
    prices: &PriceSeries,
    windows: &[usize],
) -> Result<Vec<MovingAverageSeries>, AppError> {
    windows.iter().map(|&w| moving_average(prices, w)).collect()
}
