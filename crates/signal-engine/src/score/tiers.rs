//! Threshold tables for the composite score

use serde::{Deserialize, Serialize};

/// Strict comparison of a metric against a tier threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cmp {
    #[serde(rename = ">")]
    Above,
    #[serde(rename = "<")]
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Direction of the strict comparison
    pub cmp: Cmp,
    /// Value the metric is compared against, in the metric's own unit
    pub threshold: f64,
    /// Awarded when the comparison holds
    pub points: f64,
}

impl Tier {
    pub fn above(threshold: f64, points: f64) -> Self {
        Self {
            cmp: Cmp::Above,
            threshold,
            points,
        }
    }

    pub fn below(threshold: f64, points: f64) -> Self {
        Self {
            cmp: Cmp::Below,
            threshold,
            points,
        }
    }

    fn matches(&self, value: f64) -> bool {
        match self.cmp {
            Cmp::Above => value > self.threshold,
            Cmp::Below => value < self.threshold,
        }
    }
}

/// Ordered rules; the first matching tier awards its points, none awards 0
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierTable(Vec<Tier>);

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self(tiers)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.0
    }

    pub fn points(&self, value: f64) -> f64 {
        self.0
            .iter()
            .find(|tier| tier.matches(value))
            .map_or(0.0, |tier| tier.points)
    }

    /// Points for an optional metric; unavailable contributes 0
    pub fn points_for(&self, value: Option<f64>) -> f64 {
        value.map_or(0.0, |v| self.points(v))
    }
}

/// How a smooth-or-bucketed term is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermMode {
    /// Points from the first matching tier
    #[default]
    Tiered,
    /// `value * weight`
    Linear,
}
