//! Derived valuation ratios
//!
//! Every helper guards its denominator. An unusable input comes back as
//! `None` ("metric unavailable") instead of a zero or a panic; the scoring
//! strategies decide which default, if any, stands in for it.

use crate::error::{Result, SignalError};
use crate::model::Fundamentals;
use serde::{Deserialize, Serialize};

/// Keep a value only when it is finite and strictly positive
pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn finite_nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Historical high divided by current price
pub fn n_ratio(symbol: &str, historical_high: f64, current_price: f64) -> Result<f64> {
    if !current_price.is_finite() || current_price <= 0.0 {
        return Err(SignalError::invalid_input(
            symbol,
            format!("current price {current_price:.2} is not positive"),
        ));
    }
    Ok(historical_high / current_price)
}

/// Percentage decline of `price` from `high`
pub fn drawdown_pct(high: f64, price: f64) -> Option<f64> {
    (high.is_finite() && high > 0.0).then(|| (high - price) / high * 100.0)
}

/// Free cash flow over market cap, in percent; only for positive cash flow
pub fn fcf_yield(fundamentals: &Fundamentals) -> Option<f64> {
    let fcf = positive(fundamentals.free_cashflow)?;
    let market_cap = positive(fundamentals.market_cap)?;
    Some(fcf / market_cap * 100.0)
}

/// Forward P/E over trailing P/E, 1.0 when either is unavailable
pub fn forward_trailing_ratio(fundamentals: &Fundamentals) -> f64 {
    match (
        positive(fundamentals.forward_pe),
        positive(fundamentals.trailing_pe),
    ) {
        (Some(forward), Some(trailing)) => forward / trailing,
        _ => 1.0,
    }
}

/// Return on equity, falling back to return on assets
pub fn roic_proxy(fundamentals: &Fundamentals) -> Option<f64> {
    finite_nonzero(fundamentals.return_on_equity)
        .or_else(|| finite_nonzero(fundamentals.return_on_assets))
}

/// Debt/equity in percent; negative equity makes the ratio meaningless
pub fn debt_to_equity(fundamentals: &Fundamentals) -> Option<f64> {
    fundamentals
        .debt_to_equity
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Earnings growth in percent
pub fn earnings_growth_pct(fundamentals: &Fundamentals) -> Option<f64> {
    fundamentals
        .earnings_growth
        .filter(|v| v.is_finite())
        .map(|g| g * 100.0)
}

/// Defaults used when the provider has no usable PEG ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PegFallback {
    /// P/E used when neither forward nor trailing P/E is available
    pub fallback_pe: f64,
    /// Fractional earnings growth assumed when the provider reports none
    pub default_growth: f64,
    /// PEG assigned when growth is zero or negative
    pub sentinel: f64,
}

impl Default for PegFallback {
    fn default() -> Self {
        Self {
            fallback_pe: 20.0,
            default_growth: 0.10,
            sentinel: 99.0,
        }
    }
}

/// Where a PEG value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PegSource {
    Reported,
    /// `pe / growth` when the provider reports none
    Derived,
    /// No usable growth
    Sentinel,
    /// Configured fallback of the relative strategy
    Default,
}

impl PegSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::Derived => "derived",
            Self::Sentinel => "sentinel",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPeg {
    pub value: f64,
    pub source: PegSource,
}

/// Reported PEG, else `pe / (growth * 100)`, else the sentinel
pub fn resolve_peg(fundamentals: &Fundamentals, fallback: &PegFallback) -> ResolvedPeg {
    if let Some(value) = positive(fundamentals.peg_ratio) {
        return ResolvedPeg {
            value,
            source: PegSource::Reported,
        };
    }

    let growth = finite_nonzero(fundamentals.earnings_growth).unwrap_or(fallback.default_growth) * 100.0;
    if growth <= 0.0 {
        return ResolvedPeg {
            value: fallback.sentinel,
            source: PegSource::Sentinel,
        };
    }

    let pe = positive(fundamentals.forward_pe)
        .or_else(|| positive(fundamentals.trailing_pe))
        .unwrap_or(fallback.fallback_pe);

    ResolvedPeg {
        value: pe / growth,
        source: PegSource::Derived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_n_ratio() {
        assert_eq!(n_ratio("SPY", 100.0, 100.0).unwrap(), 1.0);
        assert_relative_eq!(n_ratio("SPY", 150.0, 100.0).unwrap(), 1.5);
        assert!(matches!(
            n_ratio("SPY", 100.0, 0.0),
            Err(SignalError::InvalidInput { .. })
        ));
        assert!(n_ratio("SPY", 100.0, -3.0).is_err());
    }

    #[test]
    fn test_peg_fallback_from_forward_pe() {
        let fundamentals = Fundamentals {
            peg_ratio: None,
            earnings_growth: Some(0.10),
            forward_pe: Some(20.0),
            ..Default::default()
        };
        let peg = resolve_peg(&fundamentals, &PegFallback::default());
        assert_relative_eq!(peg.value, 2.0);
        assert_eq!(peg.source, PegSource::Derived);
    }

    #[test]
    fn test_peg_reported_wins() {
        let fundamentals = Fundamentals {
            peg_ratio: Some(1.4),
            forward_pe: Some(20.0),
            ..Default::default()
        };
        let peg = resolve_peg(&fundamentals, &PegFallback::default());
        assert_eq!(peg.value, 1.4);
        assert_eq!(peg.source, PegSource::Reported);
    }

    #[test]
    fn test_peg_non_positive_reported_is_ignored() {
        let fundamentals = Fundamentals {
            peg_ratio: Some(-2.0),
            trailing_pe: Some(30.0),
            earnings_growth: Some(0.15),
            ..Default::default()
        };
        let peg = resolve_peg(&fundamentals, &PegFallback::default());
        assert_relative_eq!(peg.value, 2.0);
    }

    #[test]
    fn test_peg_sentinel_on_negative_growth() {
        let fundamentals = Fundamentals {
            earnings_growth: Some(-0.2),
            forward_pe: Some(20.0),
            ..Default::default()
        };
        let peg = resolve_peg(&fundamentals, &PegFallback::default());
        assert_eq!(peg.value, 99.0);
        assert_eq!(peg.source, PegSource::Sentinel);
    }

    #[test]
    fn test_peg_defaults_when_everything_missing() {
        let peg = resolve_peg(&Fundamentals::default(), &PegFallback::default());
        // 20 / (0.10 * 100)
        assert_relative_eq!(peg.value, 2.0);
    }

    #[test]
    fn test_fcf_yield_guards() {
        let mut fundamentals = Fundamentals {
            free_cashflow: Some(5.0e9),
            market_cap: Some(100.0e9),
            ..Default::default()
        };
        assert_relative_eq!(fcf_yield(&fundamentals).unwrap(), 5.0);

        fundamentals.free_cashflow = Some(-1.0e9);
        assert!(fcf_yield(&fundamentals).is_none());

        fundamentals.free_cashflow = Some(1.0e9);
        fundamentals.market_cap = Some(0.0);
        assert!(fcf_yield(&fundamentals).is_none());
    }

    #[test]
    fn test_forward_trailing_ratio_defaults() {
        let mut fundamentals = Fundamentals {
            forward_pe: Some(18.0),
            trailing_pe: Some(24.0),
            ..Default::default()
        };
        assert_relative_eq!(forward_trailing_ratio(&fundamentals), 0.75);

        fundamentals.trailing_pe = None;
        assert_eq!(forward_trailing_ratio(&fundamentals), 1.0);
    }

    #[test]
    fn test_roic_proxy_falls_back_to_roa() {
        let fundamentals = Fundamentals {
            return_on_equity: None,
            return_on_assets: Some(0.12),
            ..Default::default()
        };
        assert_eq!(roic_proxy(&fundamentals), Some(0.12));
    }

    #[test]
    fn test_drawdown() {
        assert_relative_eq!(drawdown_pct(100.0, 45.0).unwrap(), 55.0);
        assert!(drawdown_pct(0.0, 45.0).is_none());
    }
}
