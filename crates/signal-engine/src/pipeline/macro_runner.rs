//! Macro report: fetch inputs, build the valuation z-score, classify

use crate::api::{MacroDataProvider, MarketDataProvider};
use crate::error::{Result, SignalError};
use crate::model::{Lookback, PriceHistory};
use crate::regime::{DatedSeries, MacroAssessment, MacroConfig, MacroInputs, align_daily, classify, rolling_zscore};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MacroReport {
    Assessed(MacroAssessment),
    /// The report was aborted; nothing else in the run is affected
    Failed { reason: String },
}

pub struct MacroRunner<M, F> {
    market: M,
    macro_data: F,
    config: MacroConfig,
}

impl<M: MarketDataProvider, F: MacroDataProvider> MacroRunner<M, F> {
    pub fn new(market: M, macro_data: F, config: MacroConfig) -> Self {
        Self {
            market,
            macro_data,
            config,
        }
    }

    pub async fn run(&self) -> MacroReport {
        match self.assess().await {
            Ok(assessment) => {
                tracing::info!("Macro regime: {}", assessment.regime);
                MacroReport::Assessed(assessment)
            }
            Err(e) => {
                tracing::warn!("Macro report aborted: {}", e);
                MacroReport::Failed { reason: e.to_string() }
            }
        }
    }

    async fn last_close(&self, symbol: &str) -> Result<f64> {
        self.market
            .history(symbol, Lookback::FiveDays)
            .await?
            .last_close()
            .filter(|p| *p > 0.0)
            .ok_or_else(|| SignalError::invalid_input(symbol, "no positive recent close"))
    }

    /// First proxy with a non-empty history
    async fn market_cap_proxy(&self) -> Result<PriceHistory> {
        for symbol in &self.config.market_cap_proxies {
            match self.market.history(symbol, Lookback::Max).await {
                Ok(history) if !history.is_empty() => {
                    tracing::debug!("Using {} as market cap proxy ({} bars)", symbol, history.len());
                    return Ok(history);
                }
                Ok(_) => tracing::debug!("Market cap proxy {} returned no bars", symbol),
                Err(e) => tracing::debug!("Market cap proxy {} failed: {}", symbol, e),
            }
        }
        Err(SignalError::upstream(
            "market cap proxy",
            format!("no history for any of {}", self.config.market_cap_proxies.join(", ")),
        ))
    }

    pub async fn assess(&self) -> Result<MacroAssessment> {
        let sp500_price = self.last_close(&self.config.sp500_symbol).await?;
        let gold_price = self.last_close(&self.config.gold_symbol).await?;
        let proxy = self.market_cap_proxy().await?;
        let gdp = self.macro_data.series(&self.config.gdp_series).await?;
        let yield_spread = self
            .macro_data
            .series(&self.config.yield_spread_series)
            .await?
            .last()
            .map(|(_, v)| v)
            .ok_or_else(|| SignalError::upstream("FRED", format!("empty series {}", self.config.yield_spread_series)))?;

        let ratio = align_daily(&DatedSeries::from_history(&proxy), &gdp);
        if ratio.len() < self.config.min_overlap_days {
            return Err(SignalError::InsufficientHistory(format!(
                "market cap proxy and GDP overlap for {} days, need {}",
                ratio.len(),
                self.config.min_overlap_days
            )));
        }

        let buffett_zscore = rolling_zscore(
            &ratio.values(),
            self.config.zscore_window,
            self.config.zscore_min_periods,
        );
        if buffett_zscore.is_none() {
            tracing::warn!("Valuation z-score unavailable from {} aligned points", ratio.len());
        }

        Ok(classify(
            MacroInputs {
                sp500_price,
                gold_price,
                buffett_zscore,
                yield_spread,
            },
            &self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockMacroDataProvider, MockMarketDataProvider};
    use crate::model::history::bar;
    use crate::regime::Regime;
    use chrono::{Days, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    fn rising_history(symbol: &str, days: u64) -> PriceHistory {
        let bars = (0..days)
            .map(|i| {
                let date = start().checked_add_days(Days::new(i)).unwrap();
                let close = 100.0 + i as f64;
                bar(&date.format("%Y-%m-%d").to_string(), close, close)
            })
            .collect();
        PriceHistory::new(symbol, bars)
    }

    fn market(proxy_days: u64) -> MockMarketDataProvider {
        let mut market = MockMarketDataProvider::new();
        market.expect_history().returning(move |symbol, _| match symbol {
            "^GSPC" => Ok(PriceHistory::new(symbol, vec![bar("2024-06-03", 5000.0, 5000.0)])),
            "GC=F" => Ok(PriceHistory::new(symbol, vec![bar("2024-06-03", 2000.0, 2000.0)])),
            "^FTW5000" => Err(SignalError::upstream("Yahoo Finance", "^FTW5000: HTTP 404")),
            _ => Ok(rising_history(symbol, proxy_days)),
        });
        market
    }

    fn fred(spread: f64) -> MockMacroDataProvider {
        let mut fred = MockMacroDataProvider::new();
        fred.expect_series().returning(move |id| match id {
            "GDP" => Ok(DatedSeries::new(vec![
                (NaiveDate::from_ymd_opt(2019, 10, 1).unwrap(), 10.0),
                (NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 10.0),
            ])),
            _ => Ok(DatedSeries::new(vec![(start(), 0.3), (NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), spread)])),
        });
        fred
    }

    #[tokio::test]
    async fn test_assessment_with_proxy_fallback() {
        let runner = MacroRunner::new(market(1000), fred(-0.5), MacroConfig::default());
        let MacroReport::Assessed(assessment) = runner.run().await else {
            panic!("expected an assessment");
        };

        // linear ratio over 1000 days: z of the last point is about 1.73
        let z = assessment.inputs.buffett_zscore.unwrap();
        assert!(z > 1.7 && z < 1.75, "z = {z}");
        assert_eq!(assessment.sp_gold_ratio, 2.5);
        assert_eq!(assessment.regime, Regime::RecessionWarning);
    }

    #[tokio::test]
    async fn test_short_overlap_aborts_report() {
        let runner = MacroRunner::new(market(100), fred(0.5), MacroConfig::default());
        let MacroReport::Failed { reason } = runner.run().await else {
            panic!("expected a failure");
        };
        assert!(reason.contains("overlap for 100 days"), "{reason}");
    }

    #[tokio::test]
    async fn test_missing_series_aborts_report() {
        let mut fred = MockMacroDataProvider::new();
        fred.expect_series()
            .returning(|id| Err(SignalError::upstream("FRED", format!("{id}: HTTP 500"))));

        let runner = MacroRunner::new(market(1000), fred, MacroConfig::default());
        let report = runner.run().await;
        assert!(matches!(report, MacroReport::Failed { .. }));
    }

    #[tokio::test]
    async fn test_no_proxy_history() {
        let mut market = MockMarketDataProvider::new();
        market.expect_history().returning(|symbol, lookback| match lookback {
            Lookback::FiveDays => Ok(PriceHistory::new(symbol, vec![bar("2024-06-03", 10.0, 10.0)])),
            _ => Ok(PriceHistory::new(symbol, Vec::new())),
        });

        let runner = MacroRunner::new(market, fred(0.5), MacroConfig::default());
        let err = runner.assess().await.unwrap_err();
        assert!(err.to_string().contains("^FTW5000, ^W5000, VTI"));
    }
}
