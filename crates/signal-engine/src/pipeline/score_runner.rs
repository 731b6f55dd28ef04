//! Sequential per-ticker scoring with an explicit benchmark-first order

use crate::api::MarketDataProvider;
use crate::error::{Result, SignalError};
use crate::model::{HistoryConfig, Lookback, SecurityRole, SecuritySnapshot, TickerSpec};
use crate::score::{BenchmarkReference, ScoreEngine, ScoreResult, Strategy};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A ticker that could not be scored; the batch carries on without it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerFailure {
    pub symbol: String,
    pub role: SecurityRole,
    pub reason: String,
}

impl TickerFailure {
    fn from_error(spec: &TickerSpec, error: &SignalError) -> Self {
        Self {
            symbol: spec.symbol.clone(),
            role: spec.role,
            reason: error.skip_reason(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TickerOutcome {
    Scored(ScoreResult),
    Skipped(TickerFailure),
}

impl TickerOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Scored(result) => &result.symbol,
            Self::Skipped(failure) => &failure.symbol,
        }
    }
}

/// Results of one run, in configured ticker order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBatch {
    pub strategy: Strategy,
    pub lookback: Lookback,
    /// Baseline the dependent tickers were scored against
    pub benchmark: BenchmarkReference,
    pub generated_at: DateTime<Utc>,
    pub outcomes: Vec<TickerOutcome>,
}

impl ScoreBatch {
    pub fn scored(&self) -> impl Iterator<Item = &ScoreResult> {
        self.outcomes.iter().filter_map(|o| match o {
            TickerOutcome::Scored(result) => Some(result),
            TickerOutcome::Skipped(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &TickerFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            TickerOutcome::Skipped(failure) => Some(failure),
            TickerOutcome::Scored(_) => None,
        })
    }

    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.scored().count() as f64 / self.outcomes.len() as f64
    }
}

pub struct ScoreRunner<P> {
    provider: P,
    engine: ScoreEngine,
    history: HistoryConfig,
}

impl<P: MarketDataProvider> ScoreRunner<P> {
    pub fn new(provider: P, engine: ScoreEngine, history: HistoryConfig) -> Self {
        Self {
            provider,
            engine,
            history,
        }
    }

    /// Indices into `tickers`, benchmark-role tickers first, otherwise stable
    pub fn processing_order(tickers: &[TickerSpec]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..tickers.len()).collect();
        order.sort_by_key(|&i| tickers[i].role != SecurityRole::Benchmark);
        order
    }

    async fn score_ticker(&self, spec: &TickerSpec, benchmark: &BenchmarkReference) -> Result<ScoreResult> {
        let fundamentals = self.provider.fundamentals(&spec.symbol).await?;
        let history = self.provider.history(&spec.symbol, self.engine.lookback()).await?;
        let snapshot = SecuritySnapshot::assemble(spec, fundamentals, &history, &self.history)?;
        self.engine.score(&snapshot, benchmark)
    }

    pub async fn run(&self, tickers: &[TickerSpec]) -> ScoreBatch {
        let mut benchmark = self.engine.default_benchmark();
        let mut outcomes: Vec<Option<TickerOutcome>> = vec![None; tickers.len()];

        if self.engine.strategy() == Strategy::Relative
            && !tickers.iter().any(|t| t.role == SecurityRole::Benchmark)
        {
            tracing::warn!(
                "No benchmark ticker configured, using default baseline (P/E {:.1}, n {:.2})",
                benchmark.trailing_pe,
                benchmark.n_ratio
            );
        }

        for idx in Self::processing_order(tickers) {
            let spec = &tickers[idx];
            tracing::info!("Processing {} ({})", spec.symbol, spec.role);

            let outcome = match self.score_ticker(spec, &benchmark).await {
                Ok(result) => {
                    // Written once per run
                    if let Some(capture) = result.benchmark_capture.as_ref().filter(|_| benchmark.is_default()) {
                        tracing::info!(
                            "Benchmark {} captured: P/E {:.2}, n {:.4}",
                            spec.symbol,
                            capture.trailing_pe,
                            capture.n_ratio
                        );
                        benchmark = capture.clone();
                    }
                    TickerOutcome::Scored(result)
                }
                Err(e) => {
                    tracing::warn!("{} skipped: {}", spec.symbol, e);
                    if spec.role == SecurityRole::Benchmark {
                        tracing::warn!(
                            "Benchmark unavailable, dependents use default baseline (P/E {:.1}, n {:.2})",
                            benchmark.trailing_pe,
                            benchmark.n_ratio
                        );
                    }
                    TickerOutcome::Skipped(TickerFailure::from_error(spec, &e))
                }
            };
            outcomes[idx] = Some(outcome);
        }

        ScoreBatch {
            strategy: self.engine.strategy(),
            lookback: self.engine.lookback(),
            benchmark,
            generated_at: Utc::now(),
            outcomes: outcomes.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMarketDataProvider;
    use crate::model::history::bar;
    use crate::model::{Fundamentals, PriceHistory};
    use crate::score::{BenchmarkSource, CompositeConfig, RelativeConfig};
    use approx::assert_relative_eq;
    use mockall::Sequence;

    fn relative_engine() -> ScoreEngine {
        ScoreEngine::new(Strategy::Relative, RelativeConfig::default(), CompositeConfig::default())
    }

    fn fundamentals(price: f64, trailing: f64, forward: f64, peg: f64) -> Fundamentals {
        Fundamentals {
            current_price: Some(price),
            trailing_pe: Some(trailing),
            forward_pe: Some(forward),
            peg_ratio: Some(peg),
            ..Default::default()
        }
    }

    fn history(symbol: &str, high: f64, close: f64) -> PriceHistory {
        PriceHistory::new(symbol, vec![bar("2024-01-02", high, close)])
    }

    fn tickers() -> Vec<TickerSpec> {
        vec![
            TickerSpec::equity("AAPL"),
            TickerSpec::new("SPY", SecurityRole::Benchmark),
        ]
    }

    #[test]
    fn test_processing_order_puts_benchmark_first() {
        let tickers = vec![
            TickerSpec::equity("AAPL"),
            TickerSpec::new("GLD", SecurityRole::Commodity),
            TickerSpec::new("SPY", SecurityRole::Benchmark),
            TickerSpec::equity("MSFT"),
        ];
        assert_eq!(ScoreRunner::<MockMarketDataProvider>::processing_order(&tickers), vec![2, 0, 1, 3]);
    }

    #[tokio::test]
    async fn test_benchmark_listed_last_is_still_captured_first() {
        let mut provider = MockMarketDataProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_fundamentals()
            .withf(|symbol| symbol == "SPY")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(fundamentals(100.0, 20.0, 20.0, 1.0)));
        provider
            .expect_fundamentals()
            .withf(|symbol| symbol == "AAPL")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(fundamentals(100.0, 30.0, 25.0, 1.5)));
        provider.expect_history().returning(|symbol, _| match symbol {
            "SPY" => Ok(history("SPY", 110.0, 100.0)),
            _ => Ok(history(symbol, 120.0, 100.0)),
        });

        let runner = ScoreRunner::new(provider, relative_engine(), HistoryConfig::default());
        let batch = runner.run(&tickers()).await;

        assert_eq!(batch.outcomes[0].symbol(), "AAPL");
        assert_eq!(batch.outcomes[1].symbol(), "SPY");
        assert_eq!(batch.benchmark.source, BenchmarkSource::Captured("SPY".to_string()));

        let aapl = batch.scored().next().unwrap();
        let expected = (1.5_f64 / 2.0).powi(2) * (250.0 / 20.0) * (30.0_f64 / 25.0).powi(3) * 1.2_f64.powi(2) * 1.1;
        assert_relative_eq!(aapl.score, expected, max_relative = 1e-12);
    }

    #[tokio::test]
    async fn test_failed_benchmark_uses_default_baseline() {
        let mut provider = MockMarketDataProvider::new();
        provider.expect_fundamentals().returning(|symbol| match symbol {
            "SPY" => Err(SignalError::upstream("Yahoo Finance", "SPY: HTTP 503")),
            _ => Ok(fundamentals(100.0, 25.0, 25.0, 1.0)),
        });
        provider
            .expect_history()
            .returning(|symbol, _| Ok(history(symbol, 100.0, 100.0)));

        let runner = ScoreRunner::new(provider, relative_engine(), HistoryConfig::default());
        let batch = runner.run(&tickers()).await;

        assert!(batch.benchmark.is_default());
        let aapl = batch.scored().next().unwrap();
        // baseline pe 25, n 1: 1 * 10 * 1 * 1 * 1
        assert_relative_eq!(aapl.score, 10.0, max_relative = 1e-12);

        let failure = batch.failures().next().unwrap();
        assert_eq!(failure.symbol, "SPY");
        assert!(failure.reason.contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_ticker_failures_are_isolated() {
        let mut provider = MockMarketDataProvider::new();
        provider.expect_fundamentals().returning(|symbol| match symbol {
            "NOPE" => Err(SignalError::upstream("Yahoo Finance", "NOPE: empty result")),
            "ZERO" => Ok(fundamentals(0.0, 20.0, 20.0, 1.0)),
            _ => Ok(fundamentals(50.0, 20.0, 18.0, 1.2)),
        });
        provider
            .expect_history()
            .returning(|symbol, _| Ok(history(symbol, 100.0, 50.0)));

        let runner = ScoreRunner::new(provider, ScoreEngine::default(), HistoryConfig::default());
        let batch = runner
            .run(&[
                TickerSpec::equity("NOPE"),
                TickerSpec::equity("MSFT"),
                TickerSpec::equity("ZERO"),
            ])
            .await;

        assert_eq!(batch.outcomes.len(), 3);
        assert_eq!(batch.scored().count(), 1);
        assert_relative_eq!(batch.success_rate(), 1.0 / 3.0);

        let reasons: Vec<&str> = batch.failures().map(|f| f.reason.as_str()).collect();
        assert!(reasons[0].contains("empty result"));
        assert_eq!(reasons[1], "current price 0.00 is not positive");
    }

    #[tokio::test]
    async fn test_missing_pe_is_a_skip_line() {
        let mut provider = MockMarketDataProvider::new();
        provider.expect_fundamentals().returning(|_| {
            Ok(Fundamentals {
                current_price: Some(10.0),
                ..Default::default()
            })
        });
        provider
            .expect_history()
            .returning(|symbol, _| Ok(history(symbol, 12.0, 10.0)));

        let runner = ScoreRunner::new(provider, relative_engine(), HistoryConfig::default());
        let batch = runner.run(&[TickerSpec::equity("GOOGL")]).await;

        let failure = batch.failures().next().unwrap();
        assert_eq!(failure.reason, "P/E unavailable");
    }
}
