use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::config::HttpClientConfig;
use crate::external::bar_provider::{BarProvider, ChartRange, ProviderError};
use crate::external::retry::with_retry;
use crate::services::bar_normalizer::RawBarColumns;

/// Yahoo Finance v8 chart API. No API key required.
pub struct YahooChartProvider {
    client: reqwest::Client,
    base_url: Url,
    policy: HttpClientConfig,
}

impl YahooChartProvider {
    pub fn new(base_url: &str, policy: &HttpClientConfig) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProviderError::Config(format!("invalid base url {base_url}: {e}")))?;

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(policy.timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            policy: policy.clone(),
        })
    }

    /// `{base}/v8/finance/chart/{symbol}`; the symbol is escaped as a single path segment.
    pub fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Config("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    async fn fetch_once(&self, url: &Url, range: ChartRange) -> Result<RawBarColumns, ProviderError> {
        let resp = self
            .client
            .get(url.clone())
            .query(&[
                ("period1", range.period1.to_string()),
                ("period2", range.period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Yahoo Finance API error: {} - {}", status, body);
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let body: ChartResponse =
            serde_json::from_slice(&bytes).map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_chart(body)
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

fn parse_chart(body: ChartResponse) -> Result<RawBarColumns, ProviderError> {
    if let Some(err) = body.chart.error {
        return Err(ProviderError::BadResponse(format!(
            "{}: {}",
            err.code.unwrap_or_else(|| "error".into()),
            err.description.unwrap_or_default()
        )));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::BadResponse("missing result".into()))?;

    // A range without trading days comes back without timestamps or quote columns.
    let Some(timestamps) = result.timestamp else {
        return Ok(RawBarColumns {
            timestamps: Vec::new(),
            open: Some(Vec::new()),
            high: Some(Vec::new()),
            low: Some(Vec::new()),
            close: Some(Vec::new()),
            volume: Some(Vec::new()),
        });
    };

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::BadResponse("missing quote".into()))?;

    Ok(RawBarColumns {
        timestamps,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
    })
}

#[async_trait]
impl BarProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: ChartRange,
    ) -> Result<RawBarColumns, ProviderError> {
        let url = self.chart_url(symbol)?;
        debug!("GET {} period1={} period2={}", url, range.period1, range.period2);

        let label = format!("Yahoo chart request for {symbol}");
        let url = &url;
        with_retry(&self.policy, &label, move || self.fetch_once(url, range)).await
    }
}
