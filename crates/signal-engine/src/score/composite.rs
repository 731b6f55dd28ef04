//! Fundamentals composite score (strategy B), 0-100
//!
//! Independent terms are summed in a fixed order and the total clamped.
//! Missing inputs contribute nothing rather than failing the ticker.

use super::bucket::{Bucket, Direction};
use super::tiers::{TermMode, Tier, TierTable};
use super::{Component, Metric};
use crate::metrics::{
    PegFallback, ResolvedPeg, debt_to_equity, drawdown_pct, earnings_growth_pct, fcf_yield,
    forward_trailing_ratio, resolve_peg, roic_proxy,
};
use crate::model::{Lookback, SecuritySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// "Good" thresholds for bucket labels
const ROIC_GOOD: f64 = 0.18;
const FCF_GOOD: f64 = 5.0;
const PEG_GOOD: f64 = 1.0;
const DEBT_GOOD: f64 = 50.0;
const FWD_TRAILING_GOOD: f64 = 0.9;
const DRAWDOWN_GOOD: f64 = 50.0;

/// Maps a score to a daily dollar-cost-averaging amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    pub base_daily_amount: f64,
    /// Multiple of the base amount paid at a score of 100
    pub max_multiplier: f64,
    pub investment_ceiling: f64,
    /// Scores below this invest nothing
    pub score_floor: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            base_daily_amount: 10.0,
            max_multiplier: 6.0,
            investment_ceiling: 100.0,
            score_floor: 40.0,
        }
    }
}

impl AllocationConfig {
    pub fn daily_amount(&self, score: f64) -> f64 {
        if score < self.score_floor {
            return 0.0;
        }
        (self.base_daily_amount * (score / 100.0) * self.max_multiplier).min(self.investment_ceiling)
    }
}

/// Both conditions are strict: ratio below `max_ratio`, growth above `min_growth_pct`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRule {
    pub max_ratio: f64,
    pub min_growth_pct: f64,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Window searched for the all-time high
    pub ath_lookback: Lookback,
    pub roic_mode: TermMode,
    /// Thresholds on ROIC as a fraction (0.25 = 25%)
    pub roic_tiers: TierTable,
    /// Points per unit of ROIC in linear mode
    pub roic_linear_weight: f64,
    pub fcf_mode: TermMode,
    /// Thresholds on free-cash-flow yield in percent
    pub fcf_tiers: TierTable,
    /// Points per percent of FCF yield in linear mode
    pub fcf_linear_weight: f64,
    pub peg_tiers: TierTable,
    /// How a missing PEG is derived
    pub peg_fallback: PegFallback,
    /// Thresholds on debt-to-equity in percent; a missing ratio scores 0
    pub debt_tiers: TierTable,
    /// Forward/trailing P/E ratio and earnings-growth pairs; the first match awards its points
    pub growth_rules: Vec<GrowthRule>,
    /// Thresholds on drawdown from the all-time high in percent
    pub drawdown_tiers: TierTable,
    /// Daily dollar-cost-averaging amount
    pub allocation: AllocationConfig,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            ath_lookback: Lookback::Max,
            roic_mode: TermMode::Tiered,
            roic_tiers: TierTable::new(vec![
                Tier::above(0.25, 25.0),
                Tier::above(0.18, 20.0),
                Tier::above(0.10, 10.0),
            ]),
            roic_linear_weight: 100.0,
            fcf_mode: TermMode::Tiered,
            fcf_tiers: TierTable::new(vec![
                Tier::above(6.0, 20.0),
                Tier::above(4.0, 12.0),
                Tier::above(2.0, 6.0),
            ]),
            fcf_linear_weight: 3.0,
            peg_tiers: TierTable::new(vec![
                Tier::below(1.0, 15.0),
                Tier::below(1.3, 10.0),
                Tier::below(1.8, 5.0),
                Tier::above(3.0, -8.0),
            ]),
            peg_fallback: PegFallback::default(),
            debt_tiers: TierTable::new(vec![Tier::below(50.0, 10.0), Tier::below(100.0, 5.0)]),
            growth_rules: vec![
                GrowthRule {
                    max_ratio: 0.9,
                    min_growth_pct: 15.0,
                    points: 10.0,
                },
                GrowthRule {
                    max_ratio: 1.0,
                    min_growth_pct: 8.0,
                    points: 6.0,
                },
            ],
            drawdown_tiers: TierTable::new(vec![
                Tier::above(70.0, 40.0),
                Tier::above(60.0, 35.0),
                Tier::above(50.0, 30.0),
                Tier::above(40.0, 22.0),
                Tier::above(30.0, 15.0),
                Tier::above(20.0, 8.0),
                Tier::above(10.0, 3.0),
            ]),
            allocation: AllocationConfig::default(),
        }
    }
}

impl CompositeConfig {
    fn term(mode: TermMode, tiers: &TierTable, weight: f64, value: Option<f64>) -> f64 {
        match (mode, value) {
            (_, None) => 0.0,
            (TermMode::Tiered, Some(v)) => tiers.points(v),
            (TermMode::Linear, Some(v)) => weight * v,
        }
    }

    fn growth_points(&self, ratio: f64, growth_pct: Option<f64>) -> f64 {
        let Some(growth) = growth_pct else {
            return 0.0;
        };
        self.growth_rules
            .iter()
            .find(|rule| ratio < rule.max_ratio && growth > rule.min_growth_pct)
            .map_or(0.0, |rule| rule.points)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOutcome {
    pub score: f64,
    pub daily_amount: f64,
    pub drawdown_pct: Option<f64>,
    pub peg: ResolvedPeg,
    pub components: BTreeMap<Metric, Component>,
}

pub fn score_composite(snapshot: &SecuritySnapshot, config: &CompositeConfig) -> CompositeOutcome {
    let f = &snapshot.fundamentals;
    let mut components = BTreeMap::new();
    let mut score = 0.0;

    let roic = roic_proxy(f);
    let points = CompositeConfig::term(config.roic_mode, &config.roic_tiers, config.roic_linear_weight, roic);
    score += points;
    components.insert(
        Metric::Roic,
        Component::new(roic, points, Bucket::classify(roic, ROIC_GOOD, Direction::HigherIsBetter)),
    );

    let fcf = fcf_yield(f);
    let points = CompositeConfig::term(config.fcf_mode, &config.fcf_tiers, config.fcf_linear_weight, fcf);
    score += points;
    components.insert(
        Metric::FcfYield,
        Component::new(fcf, points, Bucket::classify(fcf, FCF_GOOD, Direction::HigherIsBetter)),
    );

    let peg = resolve_peg(f, &config.peg_fallback);
    let points = config.peg_tiers.points(peg.value);
    score += points;
    components.insert(
        Metric::Peg,
        Component::new(
            Some(peg.value),
            points,
            Bucket::classify(Some(peg.value), PEG_GOOD, Direction::LowerIsBetter),
        ),
    );

    let debt = debt_to_equity(f);
    let points = config.debt_tiers.points_for(debt);
    score += points;
    components.insert(
        Metric::DebtToEquity,
        Component::new(debt, points, Bucket::classify(debt, DEBT_GOOD, Direction::LowerIsBetter)),
    );

    let ratio = forward_trailing_ratio(f);
    let points = config.growth_points(ratio, earnings_growth_pct(f));
    score += points;
    components.insert(
        Metric::GrowthOutlook,
        Component::new(
            Some(ratio),
            points,
            Bucket::classify(Some(ratio), FWD_TRAILING_GOOD, Direction::LowerIsBetter),
        ),
    );

    let drawdown = drawdown_pct(snapshot.all_time_high.price, snapshot.current_price);
    let points = config.drawdown_tiers.points_for(drawdown);
    score += points;
    components.insert(
        Metric::Drawdown,
        Component::new(
            drawdown,
            points,
            Bucket::classify(drawdown, DRAWDOWN_GOOD, Direction::HigherIsBetter),
        ),
    );

    let score = f64::clamp(score, 0.0, 100.0);

    CompositeOutcome {
        score,
        daily_amount: config.allocation.daily_amount(score),
        drawdown_pct: drawdown,
        peg,
        components,
    }
}
