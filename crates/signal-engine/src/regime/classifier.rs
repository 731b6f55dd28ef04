//! Macro regime classification and its static allocation table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target split between equities, the hedge asset and cash, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub equities: u8,
    pub hedge: u8,
    pub cash: u8,
}

impl Allocation {
    const fn new(equities: u8, hedge: u8, cash: u8) -> Self {
        Self {
            equities,
            hedge,
            cash,
        }
    }

    pub fn total(&self) -> u16 {
        u16::from(self.equities) + u16::from(self.hedge) + u16::from(self.cash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Bubble,
    RecessionWarning,
    ValueRecovery,
    LateCycle,
    GrowthMomentum,
    /// Valuation z-score could not be computed
    InsufficientHistory,
}

impl Regime {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bubble => "Bubble",
            Self::RecessionWarning => "Recession Warning",
            Self::ValueRecovery => "Value Recovery",
            Self::LateCycle => "Late Cycle",
            Self::GrowthMomentum => "Growth / Momentum",
            Self::InsufficientHistory => "Insufficient History",
        }
    }

    pub fn allocation(&self) -> Allocation {
        match self {
            Self::Bubble => Allocation::new(20, 30, 50),
            Self::RecessionWarning => Allocation::new(10, 50, 40),
            Self::ValueRecovery => Allocation::new(70, 20, 10),
            Self::LateCycle => Allocation::new(40, 20, 40),
            Self::GrowthMomentum => Allocation::new(60, 20, 20),
            Self::InsufficientHistory => Allocation::new(33, 33, 34),
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open band `(low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn contains(&self, value: f64) -> bool {
        value > self.low && value <= self.high
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    pub sp500_symbol: String,
    pub gold_symbol: String,
    /// Tried in order; the first with a non-empty history is used
    pub market_cap_proxies: Vec<String>,
    pub gdp_series: String,
    pub yield_spread_series: String,
    pub zscore_window: usize,
    pub zscore_min_periods: usize,
    /// Shortest acceptable overlap of market-cap proxy and GDP, in days
    pub min_overlap_days: usize,
    pub bubble_zscore: f64,
    pub recession_spread: f64,
    pub value_recovery_ratio: f64,
    pub late_cycle_band: Band,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            sp500_symbol: "^GSPC".to_string(),
            gold_symbol: "GC=F".to_string(),
            market_cap_proxies: vec!["^FTW5000".to_string(), "^W5000".to_string(), "VTI".to_string()],
            gdp_series: "GDP".to_string(),
            yield_spread_series: "T10Y2Y".to_string(),
            zscore_window: 2520,
            zscore_min_periods: 500,
            min_overlap_days: 756,
            bubble_zscore: 2.0,
            recession_spread: 0.0,
            value_recovery_ratio: 1.0,
            late_cycle_band: Band { low: 1.8, high: 2.2 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroInputs {
    pub sp500_price: f64,
    pub gold_price: f64,
    /// `None` when the valuation history is too short
    pub buffett_zscore: Option<f64>,
    /// 10y-2y treasury spread, percentage points
    pub yield_spread: f64,
}

impl MacroInputs {
    pub fn sp_gold_ratio(&self) -> f64 {
        self.sp500_price / self.gold_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAssessment {
    pub inputs: MacroInputs,
    pub sp_gold_ratio: f64,
    pub regime: Regime,
    pub allocation: Allocation,
}

/// First matching rule wins: bubble, recession, value recovery, late cycle, growth
pub fn classify(inputs: MacroInputs, config: &MacroConfig) -> MacroAssessment {
    let ratio = inputs.sp_gold_ratio();

    let regime = match inputs.buffett_zscore {
        None => Regime::InsufficientHistory,
        Some(z) if z > config.bubble_zscore => Regime::Bubble,
        Some(_) if inputs.yield_spread < config.recession_spread => Regime::RecessionWarning,
        Some(_) if ratio < config.value_recovery_ratio => Regime::ValueRecovery,
        Some(_) if config.late_cycle_band.contains(ratio) => Regime::LateCycle,
        Some(_) => Regime::GrowthMomentum,
    };

    MacroAssessment {
        sp_gold_ratio: ratio,
        allocation: regime.allocation(),
        regime,
        inputs,
    }
}
