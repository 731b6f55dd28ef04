//! Per-ticker inputs to the score engine

use crate::error::{Result, SignalError};
use crate::metrics::positive;
use crate::model::history::PriceHistory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a security takes part in scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityRole {
    /// Supplies the relative baseline read by every other ticker
    Benchmark,
    /// Hedge asset without earnings; scored off the benchmark P/E
    #[serde(alias = "hedge")]
    Commodity,
    /// Ordinary stock
    #[default]
    Equity,
}

impl fmt::Display for SecurityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Benchmark => "benchmark",
            Self::Commodity => "commodity",
            Self::Equity => "equity",
        };
        f.write_str(name)
    }
}

impl FromStr for SecurityRole {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "benchmark" => Ok(Self::Benchmark),
            "commodity" | "hedge" => Ok(Self::Commodity),
            "equity" => Ok(Self::Equity),
            other => Err(SignalError::ConfigError(format!("Unknown role: {other}"))),
        }
    }
}

/// A configured ticker; the symbol is trimmed and upper-cased however it is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TickerEntry")]
pub struct TickerSpec {
    pub symbol: String,
    pub role: SecurityRole,
}

/// `{ symbol = "...", role = "..." }` as written in the config file
#[derive(Deserialize)]
struct TickerEntry {
    symbol: String,
    #[serde(default)]
    role: SecurityRole,
}

impl From<TickerEntry> for TickerSpec {
    fn from(entry: TickerEntry) -> Self {
        Self::new(entry.symbol, entry.role)
    }
}

impl TickerSpec {
    pub fn new(symbol: impl Into<String>, role: SecurityRole) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            role,
        }
    }

    pub fn equity(symbol: impl Into<String>) -> Self {
        Self::new(symbol, SecurityRole::Equity)
    }
}

/// Parses `SYMBOL` or `SYMBOL:role`
impl FromStr for TickerSpec {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        let (symbol, role) = match s.split_once(':') {
            Some((symbol, role)) => (symbol, role.parse()?),
            None => (s, SecurityRole::Equity),
        };
        if symbol.trim().is_empty() {
            return Err(SignalError::ConfigError(format!("Empty symbol in '{s}'")));
        }
        Ok(Self::new(symbol, role))
    }
}

/// Fundamentals as reported by the market data provider; any field may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub current_price: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    /// Fractional, 0.18 = 18%
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub free_cashflow: Option<f64>,
    pub market_cap: Option<f64>,
    /// Percentage units, 45.0 = 0.45x
    pub debt_to_equity: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
}

/// Snapshot assembly knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// The history must have more bars than this before its high is trusted as the all-time high
    pub min_history_bars: usize,
    /// Multiplier on the 52-week high used as ATH proxy for short histories
    pub short_history_multiplier: f64,
    /// Scale highs by adjclose/close so old pre-split highs stay comparable
    pub split_adjust: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            min_history_bars: 500,
            short_history_multiplier: 1.3,
            split_adjust: true,
        }
    }
}

/// When the all-time high printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AthDate {
    On(NaiveDate),
    /// History too short; the high is a proxy and its date unknown
    Recent,
}

impl fmt::Display for AthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Recent => f.write_str("recent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllTimeHigh {
    pub price: f64,
    pub date: AthDate,
}

/// Immutable per-run input of the score engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    pub symbol: String,
    pub role: SecurityRole,
    pub current_price: f64,
    /// Maximum high over the fetched lookback window
    pub historical_high: f64,
    pub all_time_high: AllTimeHigh,
    pub fundamentals: Fundamentals,
}

impl SecuritySnapshot {
    /// Build a snapshot from provider data.
    ///
    /// Price is the only hard requirement: missing or non-positive price is
    /// `InvalidInput`, an empty history is `UpstreamFetch`.
    pub fn assemble(
        spec: &TickerSpec,
        fundamentals: Fundamentals,
        history: &PriceHistory,
        config: &HistoryConfig,
    ) -> Result<Self> {
        let current_price = fundamentals
            .current_price
            .filter(|p| p.is_finite())
            .or_else(|| history.last_close())
            .ok_or_else(|| SignalError::invalid_input(&spec.symbol, "no current price"))?;

        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(SignalError::invalid_input(
                &spec.symbol,
                format!("current price {current_price:.2} is not positive"),
            ));
        }

        let (historical_high, high_date) = history
            .max_high(config.split_adjust)
            .ok_or_else(|| SignalError::upstream("price history", format!("no bars for {}", spec.symbol)))?;

        let all_time_high = if history.len() > config.min_history_bars {
            AllTimeHigh {
                price: historical_high,
                date: AthDate::On(high_date),
            }
        } else {
            let base = positive(fundamentals.fifty_two_week_high).unwrap_or(current_price);
            tracing::debug!(
                "{}: {} bars <= {}, using 52-week high proxy",
                spec.symbol,
                history.len(),
                config.min_history_bars
            );
            AllTimeHigh {
                price: base * config.short_history_multiplier,
                date: AthDate::Recent,
            }
        };

        Ok(Self {
            symbol: spec.symbol.clone(),
            role: spec.role,
            current_price,
            historical_high,
            all_time_high,
            fundamentals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::history::bar;

    fn long_history(bars: usize, peak: f64) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let mut out: Vec<_> = (0..bars)
            .map(|i| {
                let mut b = bar("2015-01-01", 50.0, 50.0);
                b.date = start + chrono::Duration::days(i as i64);
                b
            })
            .collect();
        out[10].high = peak;
        PriceHistory::new("MSFT", out)
    }

    #[test]
    fn test_ticker_spec_parse() {
        let spec: TickerSpec = "spy:benchmark".parse().unwrap();
        assert_eq!(spec, TickerSpec::new("SPY", SecurityRole::Benchmark));

        let spec: TickerSpec = "GLD:hedge".parse().unwrap();
        assert_eq!(spec.role, SecurityRole::Commodity);

        let spec: TickerSpec = "aapl".parse().unwrap();
        assert_eq!(spec, TickerSpec::equity("AAPL"));

        assert!(":equity".parse::<TickerSpec>().is_err());
        assert!("X:bond".parse::<TickerSpec>().is_err());
    }

    #[test]
    fn test_assemble_with_long_history() {
        let fundamentals = Fundamentals {
            current_price: Some(40.0),
            ..Default::default()
        };
        let snapshot = SecuritySnapshot::assemble(
            &TickerSpec::equity("MSFT"),
            fundamentals,
            &long_history(600, 80.0),
            &HistoryConfig::default(),
        )
        .unwrap();

        assert_eq!(snapshot.current_price, 40.0);
        assert_eq!(snapshot.historical_high, 80.0);
        assert_eq!(snapshot.all_time_high.price, 80.0);
        assert_eq!(snapshot.all_time_high.date.to_string(), "2015-01-11");
    }

    #[test]
    fn test_exactly_min_history_bars_is_short() {
        let config = HistoryConfig::default();
        let fundamentals = Fundamentals {
            current_price: Some(40.0),
            fifty_two_week_high: Some(60.0),
            ..Default::default()
        };

        let snapshot = SecuritySnapshot::assemble(
            &TickerSpec::equity("MSFT"),
            fundamentals.clone(),
            &long_history(500, 80.0),
            &config,
        )
        .unwrap();
        assert_eq!(snapshot.all_time_high.date, AthDate::Recent);

        let snapshot =
            SecuritySnapshot::assemble(&TickerSpec::equity("MSFT"), fundamentals, &long_history(501, 80.0), &config)
                .unwrap();
        assert_eq!(snapshot.all_time_high.price, 80.0);
    }

    #[test]
    fn test_ticker_spec_from_config_is_normalised() {
        let spec: TickerSpec = serde_json::from_str(r#"{"symbol": " spy ", "role": "benchmark"}"#).unwrap();
        assert_eq!(spec, TickerSpec::new("SPY", SecurityRole::Benchmark));

        let spec: TickerSpec = serde_json::from_str(r#"{"symbol": "msft"}"#).unwrap();
        assert_eq!(spec, TickerSpec::equity("MSFT"));
    }

    #[test]
    fn test_assemble_short_history_uses_proxy() {
        let fundamentals = Fundamentals {
            current_price: Some(40.0),
            fifty_two_week_high: Some(60.0),
            ..Default::default()
        };
        let snapshot = SecuritySnapshot::assemble(
            &TickerSpec::equity("NEW"),
            fundamentals,
            &long_history(100, 70.0),
            &HistoryConfig::default(),
        )
        .unwrap();

        assert_eq!(snapshot.historical_high, 70.0);
        assert!((snapshot.all_time_high.price - 78.0).abs() < 1e-9);
        assert_eq!(snapshot.all_time_high.date, AthDate::Recent);
        assert_eq!(snapshot.all_time_high.date.to_string(), "recent");
    }

    #[test]
    fn test_assemble_falls_back_to_last_close() {
        let snapshot = SecuritySnapshot::assemble(
            &TickerSpec::equity("MSFT"),
            Fundamentals::default(),
            &long_history(20, 80.0),
            &HistoryConfig::default(),
        )
        .unwrap();
        assert_eq!(snapshot.current_price, 50.0);
    }

    #[test]
    fn test_assemble_rejects_non_positive_price() {
        let fundamentals = Fundamentals {
            current_price: Some(0.0),
            ..Default::default()
        };
        let err = SecuritySnapshot::assemble(
            &TickerSpec::equity("BAD"),
            fundamentals,
            &long_history(20, 80.0),
            &HistoryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SignalError::InvalidInput { .. }));
    }

    #[test]
    fn test_assemble_rejects_empty_history() {
        let fundamentals = Fundamentals {
            current_price: Some(10.0),
            ..Default::default()
        };
        let err = SecuritySnapshot::assemble(
            &TickerSpec::equity("EMPTY"),
            fundamentals,
            &PriceHistory::new("EMPTY", vec![]),
            &HistoryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SignalError::UpstreamFetch { .. }));
    }
}
