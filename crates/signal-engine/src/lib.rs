//! Stock scoring and macro regime signals
//!
//! This crate turns market data into two kinds of daily signal:
//!
//! - A per-ticker score from the Score Engine, either relative to a benchmark
//!   P/E (strategy A) or a 0-100 fundamentals composite with a daily
//!   dollar-cost-averaging amount (strategy B)
//! - A macro regime (bubble, recession warning, ...) from a market-cap/GDP
//!   z-score, the 10Y-2Y yield spread and the S&P/gold ratio, with a fixed
//!   target allocation per regime
//!
//! # Architecture
//!
//! Data comes in through the [`MarketDataProvider`] and [`MacroDataProvider`]
//! traits (Yahoo Finance and FRED clients in [`api`]). The runners in
//! [`pipeline`] build snapshots, call the pure [`ScoreEngine`] and
//! [`classify`], and isolate failures per ticker or per report. [`report`]
//! renders the results and [`platforms`] delivers them.
//!
//! # Example
//!
//! ```rust,ignore
//! use signal_engine::{ScoreRunner, SignalConfig, YahooFinanceClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SignalConfig::default();
//!     let yahoo = YahooFinanceClient::new(&config.provider);
//!
//!     let runner = ScoreRunner::new(yahoo, config.engine(), config.history.clone());
//!     let batch = runner.run(&config.tickers).await;
//!     println!("{} of {} tickers scored", batch.scored().count(), batch.outcomes.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod platforms;
pub mod regime;
pub mod report;
pub mod score;

// Re-export main types for convenience
pub use api::{FredClient, MacroDataProvider, MarketDataProvider, YahooFinanceClient};
pub use config::{ProviderConfig, SignalConfig, SignalConfigBuilder};
pub use error::{Result, SignalError};
pub use model::{Lookback, SecurityRole, SecuritySnapshot, TickerSpec};
pub use pipeline::{MacroReport, MacroRunner, ScoreBatch, ScoreRunner, TickerFailure, TickerOutcome};
pub use platforms::{DeliveryStatus, Dispatcher, Notifier, NotifyConfig};
pub use regime::{MacroAssessment, Regime, classify};
pub use report::{FormatterFactory, OutputFormat, ReportPlatform, RunReport};
pub use score::{ScoreEngine, ScoreResult, Strategy};
