//! Relative baseline shared by every ticker within one run

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkSource {
    /// Captured from the benchmark-role ticker of this run
    Captured(String),
    /// Benchmark missing or failed; configured baseline in use
    Default,
}

/// Benchmark P/E, n-ratio and PEG read by dependent tickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReference {
    pub trailing_pe: f64,
    pub n_ratio: f64,
    pub peg_ratio: f64,
    pub source: BenchmarkSource,
}

impl BenchmarkReference {
    pub fn captured(symbol: impl Into<String>, trailing_pe: f64, n_ratio: f64, peg_ratio: f64) -> Self {
        Self {
            trailing_pe,
            n_ratio,
            peg_ratio,
            source: BenchmarkSource::Captured(symbol.into()),
        }
    }

    pub fn is_default(&self) -> bool {
        self.source == BenchmarkSource::Default
    }
}

/// Baseline used until (or unless) a benchmark ticker is scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkDefaults {
    pub trailing_pe: f64,
    pub n_ratio: f64,
    pub peg_ratio: f64,
}

impl Default for BenchmarkDefaults {
    fn default() -> Self {
        Self {
            trailing_pe: 25.0,
            n_ratio: 1.0,
            peg_ratio: 1.0,
        }
    }
}

impl BenchmarkDefaults {
    pub fn reference(&self) -> BenchmarkReference {
        BenchmarkReference {
            trailing_pe: self.trailing_pe,
            n_ratio: self.n_ratio,
            peg_ratio: self.peg_ratio,
            source: BenchmarkSource::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_baseline() {
        let reference = BenchmarkDefaults::default().reference();
        assert_eq!(reference.trailing_pe, 25.0);
        assert_eq!(reference.n_ratio, 1.0);
        assert!(reference.is_default());
    }

    #[test]
    fn test_captured_reference() {
        let reference = BenchmarkReference::captured("SPY", 22.0, 1.05, 1.8);
        assert!(!reference.is_default());
        assert_eq!(reference.source, BenchmarkSource::Captured("SPY".to_string()));
    }
}
