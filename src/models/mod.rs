mod chart;
mod daily_bar;
mod prediction;
mod stock;

pub use chart::{AlignedRow, MovingAverageSeries, PricePoint, PriceSeries, SeriesPoint};
pub use daily_bar::DailyBar;
pub use prediction::PredictionPoint;
pub use stock::{
    FetchStockDataRequest, HealthResponse, PredictStockRequest, PredictionResponse,
    StockDataResponse,
};
