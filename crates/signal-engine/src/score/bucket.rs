//! Qualitative labels attached to component breakdowns.
//!
//! Display metadata only; nothing here feeds the score arithmetic.

use serde::{Deserialize, Serialize};

/// Four-level quality label, plus "no data"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Best,
    Ok,
    Warning,
    Bad,
    Unavailable,
}

/// Which side of the "good" threshold is desirable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Bucket {
    /// Bucket a metric against its "good" threshold
    pub fn classify(value: Option<f64>, good: f64, direction: Direction) -> Self {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return Self::Unavailable;
        };

        match direction {
            Direction::HigherIsBetter => {
                if value >= good {
                    Self::Best
                } else if value >= good * 0.7 {
                    Self::Ok
                } else if value >= good * 0.4 {
                    Self::Warning
                } else {
                    Self::Bad
                }
            }
            Direction::LowerIsBetter => {
                if value <= good {
                    Self::Best
                } else if value <= good * 1.5 {
                    Self::Ok
                } else if value <= good * 3.0 {
                    Self::Warning
                } else {
                    Self::Bad
                }
            }
        }
    }

    /// Bucket for a 0-100 composite score
    pub fn for_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Best
        } else if score >= 65.0 {
            Self::Ok
        } else if score >= 45.0 {
            Self::Warning
        } else {
            Self::Bad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Bad => "bad",
            Self::Unavailable => "n/a",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Best => "🟢",
            Self::Ok => "🟡",
            Self::Warning => "🟠",
            Self::Bad => "⛔",
            Self::Unavailable => "⚪",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_is_better() {
        let good = 0.18;
        assert_eq!(Bucket::classify(Some(0.25), good, Direction::HigherIsBetter), Bucket::Best);
        assert_eq!(Bucket::classify(Some(0.13), good, Direction::HigherIsBetter), Bucket::Ok);
        assert_eq!(Bucket::classify(Some(0.08), good, Direction::HigherIsBetter), Bucket::Warning);
        assert_eq!(Bucket::classify(Some(0.01), good, Direction::HigherIsBetter), Bucket::Bad);
    }

    #[test]
    fn test_lower_is_better() {
        assert_eq!(Bucket::classify(Some(0.9), 1.0, Direction::LowerIsBetter), Bucket::Best);
        assert_eq!(Bucket::classify(Some(1.4), 1.0, Direction::LowerIsBetter), Bucket::Ok);
        assert_eq!(Bucket::classify(Some(2.5), 1.0, Direction::LowerIsBetter), Bucket::Warning);
        assert_eq!(Bucket::classify(Some(3.5), 1.0, Direction::LowerIsBetter), Bucket::Bad);
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(Bucket::classify(None, 5.0, Direction::HigherIsBetter), Bucket::Unavailable);
        assert_eq!(Bucket::Unavailable.label(), "n/a");
    }

    #[test]
    fn test_score_bucket() {
        assert_eq!(Bucket::for_score(90.0), Bucket::Best);
        assert_eq!(Bucket::for_score(65.0), Bucket::Ok);
        assert_eq!(Bucket::for_score(50.0), Bucket::Warning);
        assert_eq!(Bucket::for_score(10.0), Bucket::Bad);
    }
}
