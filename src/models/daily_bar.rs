use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day for a symbol.
///
/// `close` is always finite once a bar has gone through the normalizer; the
/// other price fields are carried through as the provider reported them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBar {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub adj_close: Option<f64>,
}

impl DailyBar {
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite()
    }
}
