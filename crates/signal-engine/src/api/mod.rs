//! Data-provider collaborators
//!
//! The runners only see these traits; the concrete clients talk to Yahoo
//! Finance and FRED.

pub mod fred;
pub mod yahoo;

pub use fred::{FredClient, parse_fred_csv, parse_observations, series as fred_series};
pub use yahoo::{SummaryModules, YahooFinanceClient, merge_modules};

use crate::error::Result;
use crate::model::{Fundamentals, Lookback, PriceHistory};
use crate::regime::DatedSeries;
use async_trait::async_trait;

/// Per-ticker fundamentals and price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals>;

    async fn history(&self, symbol: &str, lookback: Lookback) -> Result<PriceHistory>;
}

/// Dated economic series by id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MacroDataProvider: Send + Sync {
    async fn series(&self, series_id: &str) -> Result<DatedSeries>;
}
