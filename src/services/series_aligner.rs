use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::models::{AlignedRow, MovingAverageSeries, PredictionPoint, PriceSeries};

/// Joins the price series with its moving averages and predictions, one row
/// per price date.
///
/// Auxiliary series are looked up by date, so a series that is shorter or
/// longer than the prices only leaves fields out; it never fails the join.
pub fn align(
    prices: &PriceSeries,
    moving_averages: &[MovingAverageSeries],
    predictions: Option<&[PredictionPoint]>,
) -> Vec<AlignedRow> {
    let ma_lookup: Vec<(String, HashMap<NaiveDate, Option<f64>>)> = moving_averages
        .iter()
        .map(|series| {
            let by_date = series.points.iter().map(|p| (p.date, p.value)).collect();
            (series.key(), by_date)
        })
        .collect();

    let predicted_lookup: HashMap<NaiveDate, f64> = predictions
        .unwrap_or_default()
        .iter()
        .map(|p| (p.date, p.predicted))
        .collect();

    prices
        .points()
        .iter()
        .map(|point| {
            let moving_averages: BTreeMap<String, Option<f64>> = ma_lookup
                .iter()
                .filter_map(|(key, by_date)| {
                    by_date.get(&point.date).map(|value| (key.clone(), *value))
                })
                .collect();

            AlignedRow {
                date: point.date,
                price: point.price,
                moving_averages,
                predicted: predicted_lookup.get(&point.date).copied(),
            }
        })
        .collect()
}
