//! Score Engine
//!
//! Maps a [`SecuritySnapshot`] plus the run's [`BenchmarkReference`] to a
//! [`ScoreResult`]. Deterministic and free of side effects: the benchmark
//! capture is returned to the caller rather than stored here.

pub mod benchmark;
pub mod bucket;
pub mod composite;
pub mod relative;
pub mod tiers;

pub use benchmark::{BenchmarkDefaults, BenchmarkReference, BenchmarkSource};
pub use bucket::{Bucket, Direction};
pub use composite::{AllocationConfig, CompositeConfig, CompositeOutcome, GrowthRule, score_composite};
pub use relative::{RelativeConfig, RelativeFormula, RelativeOutcome, score_relative};
pub use tiers::{Cmp, TermMode, Tier, TierTable};

use crate::error::{Result, SignalError};
use crate::metrics::{PegSource, n_ratio};
use crate::model::{AllTimeHigh, Lookback, SecurityRole, SecuritySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which scoring formula a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Relative P/E momentum, unbounded
    #[serde(alias = "relative_pe")]
    Relative,
    /// Fundamentals composite, 0-100 with allocation sizing
    #[default]
    Composite,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relative => f.write_str("relative"),
            Self::Composite => f.write_str("composite"),
        }
    }
}

impl FromStr for Strategy {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "relative" | "relative_pe" | "a" => Ok(Self::Relative),
            "composite" | "b" => Ok(Self::Composite),
            other => Err(SignalError::ConfigError(format!("Unknown strategy: {other}"))),
        }
    }
}

/// Breakdown keys, ordered as the terms are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Roic,
    FcfYield,
    Peg,
    DebtToEquity,
    GrowthOutlook,
    Drawdown,
    BenchmarkPe,
    PeTrend,
    Momentum,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Roic => "ROE/ROIC",
            Self::FcfYield => "FCF Yield",
            Self::Peg => "PEG",
            Self::DebtToEquity => "Debt/Equity",
            Self::GrowthOutlook => "Fwd/Trailing P/E",
            Self::Drawdown => "Drawdown",
            Self::BenchmarkPe => "Benchmark P/E",
            Self::PeTrend => "P/E Trend",
            Self::Momentum => "n-ratio",
        }
    }

    /// Raw metric value in display units
    pub fn format_value(&self, value: Option<f64>) -> String {
        let Some(v) = value else {
            return "N/A".to_string();
        };
        match self {
            Self::Roic => format!("{:.1}%", v * 100.0),
            Self::FcfYield | Self::DebtToEquity | Self::Drawdown => format!("{v:.1}%"),
            Self::Momentum => format!("{v:.4}"),
            Self::Peg | Self::GrowthOutlook | Self::BenchmarkPe | Self::PeTrend => format!("{v:.2}"),
        }
    }
}

/// One entry of the component breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub value: Option<f64>,
    /// Points (composite) or multiplicative factor (relative)
    pub contribution: f64,
    pub bucket: Bucket,
}

impl Component {
    pub fn new(value: Option<f64>, contribution: f64, bucket: Bucket) -> Self {
        Self {
            value,
            contribution,
            bucket,
        }
    }
}

/// Interpretation of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Compounder,
    StrongBuy,
    Decent,
    Avoid,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Compounder
        } else if score >= 70.0 {
            Self::StrongBuy
        } else if score >= 50.0 {
            Self::Decent
        } else {
            Self::Avoid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Compounder => "Generational compounder",
            Self::StrongBuy => "Strong buy",
            Self::Decent => "Decent",
            Self::Avoid => "Avoid / wait",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub symbol: String,
    pub role: SecurityRole,
    pub strategy: Strategy,
    /// Unbounded for relative, 0-100 for composite
    pub score: f64,
    /// Composite only
    pub daily_investment_amount: Option<f64>,
    /// Per-metric value, contribution and bucket
    pub components: BTreeMap<Metric, Component>,
    /// Percent below `historical_high`
    pub drawdown_pct: Option<f64>,
    pub current_price: f64,
    /// High over the strategy's lookback window
    pub historical_high: f64,
    pub all_time_high: AllTimeHigh,
    /// `current_price / historical_high`
    pub n_ratio: f64,
    pub trailing_pe: Option<f64>,
    /// Relative falls back to the trailing P/E
    pub forward_pe: Option<f64>,
    pub peg: Option<f64>,
    /// Where `peg` came from
    pub peg_source: Option<PegSource>,
    /// Composite only
    pub grade: Option<Grade>,
    /// Set when this ticker is the benchmark of the run
    pub benchmark_capture: Option<BenchmarkReference>,
}

impl ScoreResult {
    pub fn score_bucket(&self) -> Bucket {
        match self.strategy {
            Strategy::Composite => Bucket::for_score(self.score),
            Strategy::Relative => Bucket::Unavailable,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    strategy: Strategy,
    relative: RelativeConfig,
    composite: CompositeConfig,
}

impl ScoreEngine {
    pub fn new(strategy: Strategy, relative: RelativeConfig, composite: CompositeConfig) -> Self {
        Self {
            strategy,
            relative,
            composite,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// History window snapshots must be built from
    pub fn lookback(&self) -> Lookback {
        match self.strategy {
            Strategy::Relative => self.relative.lookback,
            Strategy::Composite => self.composite.ath_lookback,
        }
    }

    /// Baseline to use before a benchmark has been captured
    pub fn default_benchmark(&self) -> BenchmarkReference {
        self.relative.benchmark.reference()
    }

    pub fn score(&self, snapshot: &SecuritySnapshot, benchmark: &BenchmarkReference) -> Result<ScoreResult> {
        let n = n_ratio(&snapshot.symbol, snapshot.historical_high, snapshot.current_price)?;

        let result = match self.strategy {
            Strategy::Relative => {
                let outcome = score_relative(snapshot, benchmark, &self.relative)?;
                ScoreResult {
                    symbol: snapshot.symbol.clone(),
                    role: snapshot.role,
                    strategy: self.strategy,
                    score: outcome.score,
                    daily_investment_amount: None,
                    components: outcome.components,
                    drawdown_pct: crate::metrics::drawdown_pct(snapshot.historical_high, snapshot.current_price),
                    current_price: snapshot.current_price,
                    historical_high: snapshot.historical_high,
                    all_time_high: snapshot.all_time_high,
                    n_ratio: outcome.n_ratio,
                    trailing_pe: outcome.trailing_pe,
                    forward_pe: outcome.forward_pe,
                    peg: outcome.peg.map(|p| p.value),
                    peg_source: outcome.peg.map(|p| p.source),
                    grade: None,
                    benchmark_capture: outcome.capture,
                }
            }
            Strategy::Composite => {
                let outcome = score_composite(snapshot, &self.composite);
                ScoreResult {
                    symbol: snapshot.symbol.clone(),
                    role: snapshot.role,
                    strategy: self.strategy,
                    score: outcome.score,
                    daily_investment_amount: Some(outcome.daily_amount),
                    components: outcome.components,
                    drawdown_pct: outcome.drawdown_pct,
                    current_price: snapshot.current_price,
                    historical_high: snapshot.historical_high,
                    all_time_high: snapshot.all_time_high,
                    n_ratio: n,
                    trailing_pe: crate::metrics::positive(snapshot.fundamentals.trailing_pe),
                    forward_pe: crate::metrics::positive(snapshot.fundamentals.forward_pe),
                    peg: Some(outcome.peg.value),
                    peg_source: Some(outcome.peg.source),
                    grade: Some(Grade::from_score(outcome.score)),
                    benchmark_capture: None,
                }
            }
        };

        tracing::debug!(
            "{} scored {:.2} under {} strategy",
            result.symbol,
            result.score,
            result.strategy
        );
        Ok(result)
    }
}
