use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::DailyBar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Closing prices in ascending date order, built once from normalized bars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn from_bars(bars: &[DailyBar]) -> Self {
        Self {
            points: bars
                .iter()
                .map(|b| PricePoint {
                    date: b.date,
                    price: b.close,
                })
                .collect(),
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self { points }
    }
}

/// A dated value where `None` marks "not enough history yet".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverageSeries {
    pub window: usize,
    pub points: Vec<SeriesPoint>,
}

impl MovingAverageSeries {
    /// Column name used for this series in aligned rows, e.g. `ma50`.
    pub fn key(&self) -> String {
        format!("ma{}", self.window)
    }
}

/// One chart row. Moving average columns are flattened into the row: a key
/// holding `null` is a gap, a missing key means the series had no entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub price: f64,
    #[serde(flatten)]
    pub moving_averages: BTreeMap<String, Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted: Option<f64>,
}
