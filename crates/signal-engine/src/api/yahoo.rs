//! Yahoo Finance client
//!
//! Both price history and fundamentals go through `yahoo_finance_api`;
//! `get_ticker_info` takes care of the cookie/crumb handshake Yahoo requires
//! for the quoteSummary modules.

use super::MarketDataProvider;
use crate::config::ProviderConfig;
use crate::error::{Result, SignalError};
use crate::model::{Fundamentals, Lookback, PriceBar, PriceHistory};
use async_trait::async_trait;
use chrono::DateTime;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use yahoo_finance_api as yahoo;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Values read from each quoteSummary module of a ticker-info response.
///
/// Each module fills only the fields it reports; [`merge_modules`] decides
/// which module wins when several report the same field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryModules {
    pub financial_data: Fundamentals,
    pub key_statistics: Fundamentals,
    pub summary_detail: Fundamentals,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// First finite value in priority order: financialData, defaultKeyStatistics, summaryDetail
pub fn merge_modules(modules: &SummaryModules) -> Fundamentals {
    let pick = |field: fn(&Fundamentals) -> Option<f64>| {
        finite(field(&modules.financial_data))
            .or_else(|| finite(field(&modules.key_statistics)))
            .or_else(|| finite(field(&modules.summary_detail)))
    };

    Fundamentals {
        current_price: pick(|f| f.current_price),
        trailing_pe: pick(|f| f.trailing_pe),
        forward_pe: pick(|f| f.forward_pe),
        peg_ratio: pick(|f| f.peg_ratio),
        return_on_equity: pick(|f| f.return_on_equity),
        return_on_assets: pick(|f| f.return_on_assets),
        free_cashflow: pick(|f| f.free_cashflow),
        market_cap: pick(|f| f.market_cap),
        debt_to_equity: pick(|f| f.debt_to_equity),
        revenue_growth: pick(|f| f.revenue_growth),
        earnings_growth: pick(|f| f.earnings_growth),
        fifty_two_week_high: pick(|f| f.fifty_two_week_high),
    }
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    rate_limiter: SharedRateLimiter,
}

impl YahooFinanceClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    fn connector() -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::new().map_err(|e| SignalError::YahooFinanceError(e.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        self.rate_limiter.until_ready().await;
        tracing::debug!("Fetching ticker info for {}", symbol);

        let mut provider = Self::connector()?;
        let summary = provider
            .get_ticker_info(symbol)
            .await
            .map_err(|e| SignalError::upstream("Yahoo Finance", format!("{symbol}: {e}")))?;

        let data = summary
            .quote_summary
            .and_then(|q| q.result)
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| SignalError::upstream("Yahoo Finance", format!("{symbol}: empty ticker info")))?;

        let detail = data.summary_detail.as_ref();
        let stats = data.default_key_statistics.as_ref();
        let financial = data.financial_data.as_ref();

        // `as f64` accepts both the float and the integer fields of the response
        let modules = SummaryModules {
            financial_data: Fundamentals {
                current_price: financial.and_then(|fd| fd.current_price).map(|v| v as f64),
                return_on_equity: financial.and_then(|fd| fd.return_on_equity).map(|v| v as f64),
                return_on_assets: financial.and_then(|fd| fd.return_on_assets).map(|v| v as f64),
                free_cashflow: financial.and_then(|fd| fd.free_cashflow).map(|v| v as f64),
                debt_to_equity: financial.and_then(|fd| fd.debt_to_equity).map(|v| v as f64),
                revenue_growth: financial.and_then(|fd| fd.revenue_growth).map(|v| v as f64),
                earnings_growth: financial.and_then(|fd| fd.earnings_growth).map(|v| v as f64),
                ..Default::default()
            },
            key_statistics: Fundamentals {
                forward_pe: stats.and_then(|ks| ks.forward_pe).map(|v| v as f64),
                peg_ratio: stats.and_then(|ks| ks.peg_ratio).map(|v| v as f64),
                ..Default::default()
            },
            summary_detail: Fundamentals {
                trailing_pe: detail.and_then(|sd| sd.trailing_pe).map(|v| v as f64),
                forward_pe: detail.and_then(|sd| sd.forward_pe).map(|v| v as f64),
                market_cap: detail.and_then(|sd| sd.market_cap).map(|v| v as f64),
                fifty_two_week_high: detail.and_then(|sd| sd.fifty_two_week_high).map(|v| v as f64),
                ..Default::default()
            },
        };

        Ok(merge_modules(&modules))
    }

    async fn history(&self, symbol: &str, lookback: Lookback) -> Result<PriceHistory> {
        self.rate_limiter.until_ready().await;

        let provider = Self::connector()?;
        let response = provider
            .get_quote_range(symbol, "1d", lookback.as_range())
            .await
            .map_err(|e| SignalError::upstream("Yahoo Finance", format!("{symbol}: {e}")))?;

        let quotes = response
            .quotes()
            .map_err(|e| SignalError::YahooFinanceError(e.to_string()))?;

        let bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    adjclose: q.adjclose,
                })
            })
            .collect();

        tracing::debug!("{}: {} bars over {}", symbol, bars.len(), lookback);

        let history = PriceHistory::new(symbol, bars);
        if history.is_empty() {
            return Err(SignalError::upstream(
                "Yahoo Finance",
                format!("{symbol}: empty {lookback} history"),
            ));
        }
        Ok(history)
    }
}
