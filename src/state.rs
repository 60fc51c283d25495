use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::external::bar_provider::BarProvider;
use crate::external::prediction::{self, PredictionBackend};
use crate::external::yahoo::YahooChartProvider;

#[derive(Clone)]
pub struct AppState {
    pub bar_provider: Arc<dyn BarProvider>,
    pub prediction_backend: Arc<dyn PredictionBackend>,
}

impl AppState {
    /// Wires the Yahoo provider and the configured prediction backend.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let bar_provider = YahooChartProvider::new(&config.yahoo_base_url, &config.http)
            .map_err(|e| AppError::Internal(format!("failed to create Yahoo provider: {e}")))?;
        let prediction_backend = prediction::backend_from_config(&config)
            .map_err(|e| AppError::Internal(format!("failed to create prediction backend: {e}")))?;

        Ok(Self {
            bar_provider: Arc::new(bar_provider),
            prediction_backend,
        })
    }
}
