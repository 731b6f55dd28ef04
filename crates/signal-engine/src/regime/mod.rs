//! Macro Regime Classifier

pub mod classifier;
pub mod series;

pub use classifier::{Allocation, Band, MacroAssessment, MacroConfig, MacroInputs, Regime, classify};
pub use series::{DatedSeries, align_daily, rolling_zscore};
