//! Federal Reserve Economic Data (FRED) client
//!
//! With an API key the JSON observations endpoint is used. Without one the
//! public `fredgraph.csv` download is used instead, which needs a browser
//! User-Agent to be served.

use super::MacroDataProvider;
use crate::config::ProviderConfig;
use crate::error::{Result, SignalError};
use crate::regime::DatedSeries;
use async_trait::async_trait;
use chrono::NaiveDate;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Series ids read by the macro report
pub mod series {
    /// Nominal GDP, billions of dollars, quarterly
    pub const GDP: &str = "GDP";
    /// 10Y-2Y Treasury Spread (Yield Curve)
    pub const YIELD_SPREAD_10Y_2Y: &str = "T10Y2Y";
}

/// Observation as returned by FRED; missing values are "."
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub date: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Clone)]
pub struct FredClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    graph_base: String,
    rate_limiter: SharedRateLimiter,
}

impl FredClient {
    pub fn new(api_key: Option<String>, config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let quota = Quota::per_minute(NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_base: config.fred_api_base.trim_end_matches('/').to_string(),
            graph_base: config.fred_graph_base.clone(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Reads `FRED_API_KEY`; falls back to the CSV download when unset
    pub fn from_env(config: &ProviderConfig) -> Result<Self> {
        Self::new(std::env::var("FRED_API_KEY").ok(), config)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get_text(&self, request: reqwest::RequestBuilder, series_id: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let response = request
            .send()
            .await
            .map_err(|e| SignalError::upstream("FRED", format!("{series_id}: {e}")))?;

        if !response.status().is_success() {
            return Err(SignalError::upstream(
                "FRED",
                format!("{series_id}: HTTP {}", response.status()),
            ));
        }
        Ok(response.text().await?)
    }

    async fn fetch_json(&self, series_id: &str, api_key: &str) -> Result<DatedSeries> {
        let url = format!("{}/series/observations", self.api_base);
        let request = self.client.get(&url).query(&[
            ("series_id", series_id),
            ("api_key", api_key),
            ("file_type", "json"),
        ]);

        let body = self.get_text(request, series_id).await?;
        let data: ObservationsResponse = serde_json::from_str(&body)?;
        Ok(parse_observations(&data.observations))
    }

    async fn fetch_csv(&self, series_id: &str) -> Result<DatedSeries> {
        let request = self.client.get(&self.graph_base).query(&[("id", series_id)]);
        let body = self.get_text(request, series_id).await?;
        parse_fred_csv(&body)
    }
}

fn parse_point(date: &str, value: &str) -> Option<(NaiveDate, f64)> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let value = value.trim().parse::<f64>().ok()?;
    Some((date, value))
}

/// Observations to a series, skipping "." and unparseable rows
pub fn parse_observations(observations: &[Observation]) -> DatedSeries {
    DatedSeries::new(
        observations
            .iter()
            .filter_map(|o| parse_point(&o.date, &o.value))
            .collect(),
    )
}

/// `fredgraph.csv` body (`DATE,SERIES` header, one row per date) to a series
pub fn parse_fred_csv(body: &str) -> Result<DatedSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let (Some(date), Some(value)) = (record.get(0), record.get(1)) {
            points.extend(parse_point(date, value));
        }
    }
    Ok(DatedSeries::new(points))
}

#[async_trait]
impl MacroDataProvider for FredClient {
    async fn series(&self, series_id: &str) -> Result<DatedSeries> {
        let series = match &self.api_key {
            Some(key) => self.fetch_json(series_id, key).await?,
            None => self.fetch_csv(series_id).await?,
        };

        if series.is_empty() {
            return Err(SignalError::upstream("FRED", format!("empty series {series_id}")));
        }
        tracing::debug!("FRED {}: {} observations", series_id, series.len());
        Ok(series)
    }
}
