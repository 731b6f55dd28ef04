//! Batch runners tying providers, engine and classifier together

pub mod macro_runner;
pub mod score_runner;

pub use macro_runner::{MacroReport, MacroRunner};
pub use score_runner::{ScoreBatch, ScoreRunner, TickerFailure, TickerOutcome};
