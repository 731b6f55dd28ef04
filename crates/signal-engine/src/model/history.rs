//! Daily price history

use crate::error::SignalError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// History window requested from the market data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Lookback {
    /// Range string understood by the Yahoo chart endpoint
    pub fn as_range(&self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// Label used in report lines, e.g. "5-Year High"
    pub fn label(&self) -> &'static str {
        match self {
            Self::FiveDays => "5-Day",
            Self::OneMonth => "1-Month",
            Self::ThreeMonths => "3-Month",
            Self::SixMonths => "6-Month",
            Self::OneYear => "1-Year",
            Self::TwoYears => "2-Year",
            Self::FiveYears => "5-Year",
            Self::TenYears => "10-Year",
            Self::YearToDate => "YTD",
            Self::Max => "All-Time",
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

impl FromStr for Lookback {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lookback = match s.trim().to_lowercase().as_str() {
            "5d" => Self::FiveDays,
            "1mo" => Self::OneMonth,
            "3mo" => Self::ThreeMonths,
            "6mo" => Self::SixMonths,
            "1y" => Self::OneYear,
            "2y" => Self::TwoYears,
            "5y" => Self::FiveYears,
            "10y" => Self::TenYears,
            "ytd" => Self::YearToDate,
            "max" => Self::Max,
            other => {
                return Err(SignalError::ConfigError(format!("Invalid range: {other}")));
            }
        };
        Ok(lookback)
    }
}

/// One daily OHLC bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjclose: f64,
}

impl PriceBar {
    /// High scaled by the split/dividend adjustment factor of the bar
    pub fn adjusted_high(&self) -> f64 {
        if self.close > 0.0 && self.adjclose > 0.0 {
            self.high * self.adjclose / self.close
        } else {
            self.high
        }
    }
}

/// Price history for one symbol, ascending by date
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.retain(|b| b.high.is_finite() && b.close.is_finite());
        bars.sort_by_key(|b| b.date);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Highest high and the date it printed; the first occurrence wins ties
    pub fn max_high(&self, split_adjust: bool) -> Option<(f64, NaiveDate)> {
        self.bars.iter().fold(None, |best, bar| {
            let high = if split_adjust {
                bar.adjusted_high()
            } else {
                bar.high
            };
            match best {
                Some((value, _)) if value >= high => best,
                _ => Some((high, bar.date)),
            }
        })
    }
}

#[cfg(test)]
pub(crate) fn bar(date: &str, high: f64, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high,
        low: close,
        close,
        adjclose: close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_parse_and_display() {
        assert_eq!("5y".parse::<Lookback>().unwrap(), Lookback::FiveYears);
        assert_eq!("MAX".parse::<Lookback>().unwrap(), Lookback::Max);
        assert_eq!(Lookback::TenYears.to_string(), "10y");
        assert!("7y".parse::<Lookback>().is_err());
    }

    #[test]
    fn test_history_sorted_and_last_close() {
        let history = PriceHistory::new(
            "AAPL",
            vec![bar("2024-01-03", 12.0, 11.0), bar("2024-01-02", 10.0, 9.0)],
        );
        assert_eq!(history.bars()[0].date.to_string(), "2024-01-02");
        assert_eq!(history.last_close(), Some(11.0));
    }

    #[test]
    fn test_max_high_keeps_first_peak() {
        let history = PriceHistory::new(
            "AAPL",
            vec![
                bar("2024-01-02", 15.0, 14.0),
                bar("2024-01-03", 15.0, 14.5),
                bar("2024-01-04", 13.0, 12.0),
            ],
        );
        let (high, date) = history.max_high(false).unwrap();
        assert_eq!(high, 15.0);
        assert_eq!(date.to_string(), "2024-01-02");
    }

    #[test]
    fn test_split_adjusted_high() {
        let mut pre_split = bar("2020-01-02", 400.0, 390.0);
        pre_split.adjclose = 97.5; // 4:1 split afterwards
        let history = PriceHistory::new("AAPL", vec![pre_split, bar("2024-01-02", 120.0, 118.0)]);

        let (raw, _) = history.max_high(false).unwrap();
        let (adjusted, date) = history.max_high(true).unwrap();
        assert_eq!(raw, 400.0);
        assert_eq!(adjusted, 120.0);
        assert_eq!(date.to_string(), "2024-01-02");
    }

    #[test]
    fn test_empty_history() {
        let history = PriceHistory::new("NONE", vec![]);
        assert!(history.is_empty());
        assert!(history.max_high(true).is_none());
        assert!(history.last_close().is_none());
    }
}
