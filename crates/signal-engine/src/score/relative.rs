//! Relative P/E momentum score (strategy A)
//!
//! An empirical heuristic. The exponents and constants are kept exactly as
//! they were tuned so results stay comparable across runs:
//!
//! ```text
//! score = (1.5 / (peg + 0.5))^2 * (250 / benchmark_pe)
//!       * (trailing_pe / forward_pe)^3 * n^2 * benchmark_n
//! ```
//!
//! The output is unbounded.

use super::benchmark::{BenchmarkDefaults, BenchmarkReference};
use super::bucket::{Bucket, Direction};
use super::{Component, Metric};
use crate::error::{Result, SignalError};
use crate::metrics::{PegSource, ResolvedPeg, n_ratio, positive};
use crate::model::{Lookback, SecurityRole, SecuritySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Formula variant of strategy A
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeFormula {
    /// PEG, P/E trend and momentum relative to the benchmark
    #[default]
    BenchmarkRelative,
    /// `100 * n^2 / trailing_pe`
    Simple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelativeConfig {
    pub formula: RelativeFormula,
    /// Window the historical high is taken over
    pub lookback: Lookback,
    /// PEG used when the provider reports none
    pub peg_default: f64,
    pub peg_numerator: f64,
    pub peg_offset: f64,
    pub pe_scale: f64,
    pub simple_scale: f64,
    /// Baseline used before (or without) a benchmark capture
    pub benchmark: BenchmarkDefaults,
}

impl Default for RelativeConfig {
    fn default() -> Self {
        Self {
            formula: RelativeFormula::BenchmarkRelative,
            lookback: Lookback::FiveYears,
            peg_default: 1.0,
            peg_numerator: 1.5,
            peg_offset: 0.5,
            pe_scale: 250.0,
            simple_scale: 100.0,
            benchmark: BenchmarkDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelativeOutcome {
    pub score: f64,
    pub n_ratio: f64,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    /// None for a commodity
    pub peg: Option<ResolvedPeg>,
    pub components: BTreeMap<Metric, Component>,
    pub capture: Option<BenchmarkReference>,
}

pub fn score_relative(
    snapshot: &SecuritySnapshot,
    benchmark: &BenchmarkReference,
    config: &RelativeConfig,
) -> Result<RelativeOutcome> {
    let n = n_ratio(&snapshot.symbol, snapshot.historical_high, snapshot.current_price)?;
    let mut components = BTreeMap::new();

    // A hedge commodity has no earnings, so it is priced off the benchmark P/E alone.
    if snapshot.role == SecurityRole::Commodity {
        let momentum = n.powi(3);
        components.insert(
            Metric::Momentum,
            Component::new(Some(n), momentum, Bucket::classify(Some(n), 1.0, Direction::HigherIsBetter)),
        );
        components.insert(
            Metric::BenchmarkPe,
            Component::new(Some(benchmark.trailing_pe), benchmark.trailing_pe, Bucket::Unavailable),
        );
        return Ok(RelativeOutcome {
            score: benchmark.trailing_pe * momentum,
            n_ratio: n,
            trailing_pe: None,
            forward_pe: None,
            peg: None,
            components,
            capture: None,
        });
    }

    let trailing_pe = positive(snapshot.fundamentals.trailing_pe).ok_or_else(|| {
        SignalError::MetricUnavailable {
            symbol: snapshot.symbol.clone(),
            metric: "P/E".to_string(),
        }
    })?;
    let forward_pe = positive(snapshot.fundamentals.forward_pe).unwrap_or(trailing_pe);
    let resolved = match positive(snapshot.fundamentals.peg_ratio) {
        Some(value) => ResolvedPeg {
            value,
            source: PegSource::Reported,
        },
        None => ResolvedPeg {
            value: config.peg_default,
            source: PegSource::Default,
        },
    };
    let peg = resolved.value;

    // The benchmark is measured against itself, which makes every relative factor 1.
    let capture = (snapshot.role == SecurityRole::Benchmark)
        .then(|| BenchmarkReference::captured(&snapshot.symbol, trailing_pe, n, peg));
    let reference = capture.as_ref().unwrap_or(benchmark);

    let score = match config.formula {
        RelativeFormula::BenchmarkRelative => {
            let peg_factor = (config.peg_numerator / (peg + config.peg_offset)).powi(2);
            let pe_factor = config.pe_scale / reference.trailing_pe;
            let pe_trend = (trailing_pe / forward_pe).powi(3);
            let momentum = n.powi(2) * reference.n_ratio;

            components.insert(
                Metric::Peg,
                Component::new(Some(peg), peg_factor, Bucket::classify(Some(peg), 1.0, Direction::LowerIsBetter)),
            );
            components.insert(
                Metric::BenchmarkPe,
                Component::new(
                    Some(reference.trailing_pe),
                    pe_factor,
                    Bucket::classify(Some(trailing_pe / reference.trailing_pe), 1.0, Direction::LowerIsBetter),
                ),
            );
            components.insert(
                Metric::PeTrend,
                Component::new(
                    Some(forward_pe / trailing_pe),
                    pe_trend,
                    Bucket::classify(Some(forward_pe / trailing_pe), 0.9, Direction::LowerIsBetter),
                ),
            );
            components.insert(
                Metric::Momentum,
                Component::new(Some(n), momentum, Bucket::classify(Some(n), 1.0, Direction::HigherIsBetter)),
            );

            peg_factor * pe_factor * pe_trend * momentum
        }
        RelativeFormula::Simple => {
            components.insert(
                Metric::Momentum,
                Component::new(Some(n), n.powi(2), Bucket::classify(Some(n), 1.0, Direction::HigherIsBetter)),
            );
            config.simple_scale * n.powi(2) / trailing_pe
        }
    };

    Ok(RelativeOutcome {
        score,
        n_ratio: n,
        trailing_pe: Some(trailing_pe),
        forward_pe: Some(forward_pe),
        peg: Some(resolved),
        components,
        capture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AllTimeHigh, AthDate, Fundamentals};
    use approx::assert_relative_eq;

    fn snapshot(role: SecurityRole, price: f64, high: f64, fundamentals: Fundamentals) -> SecuritySnapshot {
        SecuritySnapshot {
            symbol: "TEST".to_string(),
            role,
            current_price: price,
            historical_high: high,
            all_time_high: AllTimeHigh {
                price: high,
                date: AthDate::Recent,
            },
            fundamentals,
        }
    }

    fn pe(trailing: f64, forward: Option<f64>, peg: Option<f64>) -> Fundamentals {
        Fundamentals {
            trailing_pe: Some(trailing),
            forward_pe: forward,
            peg_ratio: peg,
            ..Default::default()
        }
    }

    #[test]
    fn test_general_formula_exact() {
        let config = RelativeConfig::default();
        let benchmark = BenchmarkReference::captured("SPY", 20.0, 1.1, 1.5);
        let snap = snapshot(SecurityRole::Equity, 100.0, 120.0, pe(30.0, Some(25.0), Some(1.5)));

        let outcome = score_relative(&snap, &benchmark, &config).unwrap();

        let expected = (1.5_f64 / 2.0).powi(2) * (250.0 / 20.0) * (30.0_f64 / 25.0).powi(3) * 1.2_f64.powi(2) * 1.1;
        assert_relative_eq!(outcome.score, expected, max_relative = 1e-12);
        assert_relative_eq!(outcome.n_ratio, 1.2);
        assert!(outcome.capture.is_none());
    }

    #[test]
    fn test_missing_forward_and_peg_use_defaults() {
        let config = RelativeConfig::default();
        let benchmark = BenchmarkDefaults::default().reference();
        let snap = snapshot(SecurityRole::Equity, 50.0, 50.0, pe(25.0, None, None));

        let outcome = score_relative(&snap, &benchmark, &config).unwrap();

        // peg 1.0 -> (1.5/1.5)^2 = 1; 250/25 = 10; trend 1; n = 1
        assert_relative_eq!(outcome.score, 10.0);
        assert_eq!(outcome.forward_pe, Some(25.0));
        let peg = outcome.peg.unwrap();
        assert_eq!(peg.value, 1.0);
        assert_eq!(peg.source, PegSource::Default);
    }

    #[test]
    fn test_benchmark_captures_itself() {
        let config = RelativeConfig::default();
        let default = BenchmarkDefaults::default().reference();
        let snap = snapshot(SecurityRole::Benchmark, 100.0, 105.0, pe(22.0, Some(22.0), Some(2.0)));

        let outcome = score_relative(&snap, &default, &config).unwrap();
        let capture = outcome.capture.clone().unwrap();

        assert_eq!(capture.trailing_pe, 22.0);
        assert_relative_eq!(capture.n_ratio, 1.05);
        assert_eq!(capture.peg_ratio, 2.0);
        let expected = (1.5_f64 / 2.5).powi(2) * (250.0 / 22.0) * 1.05_f64.powi(2) * 1.05;
        assert_relative_eq!(outcome.score, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_commodity_bypasses_pe() {
        let config = RelativeConfig::default();
        let benchmark = BenchmarkReference::captured("SPY", 24.0, 1.0, 1.0);
        let snap = snapshot(SecurityRole::Commodity, 100.0, 110.0, Fundamentals::default());

        let outcome = score_relative(&snap, &benchmark, &config).unwrap();
        assert_relative_eq!(outcome.score, 24.0 * 1.1_f64.powi(3), max_relative = 1e-12);
        assert!(outcome.trailing_pe.is_none());
    }

    #[test]
    fn test_missing_pe_is_unavailable() {
        let config = RelativeConfig::default();
        let benchmark = BenchmarkDefaults::default().reference();
        let snap = snapshot(SecurityRole::Equity, 100.0, 110.0, Fundamentals::default());

        let err = score_relative(&snap, &benchmark, &config).unwrap_err();
        assert!(matches!(err, SignalError::MetricUnavailable { .. }));
    }

    #[test]
    fn test_invalid_price() {
        let config = RelativeConfig::default();
        let benchmark = BenchmarkDefaults::default().reference();
        let snap = snapshot(SecurityRole::Equity, 0.0, 110.0, pe(20.0, None, None));

        let err = score_relative(&snap, &benchmark, &config).unwrap_err();
        assert!(matches!(err, SignalError::InvalidInput { .. }));
    }

    #[test]
    fn test_simple_formula() {
        let config = RelativeConfig {
            formula: RelativeFormula::Simple,
            ..Default::default()
        };
        let benchmark = BenchmarkDefaults::default().reference();
        let snap = snapshot(SecurityRole::Equity, 100.0, 150.0, pe(30.0, None, None));

        let outcome = score_relative(&snap, &benchmark, &config).unwrap();
        assert_relative_eq!(outcome.score, 100.0 * 2.25 / 30.0);
    }
}
