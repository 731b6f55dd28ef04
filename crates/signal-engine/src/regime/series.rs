//! Dated value series, daily alignment and rolling statistics

use crate::model::PriceHistory;
use chrono::NaiveDate;

/// Values keyed by date, ascending, one value per date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatedSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DatedSeries {
    /// Sorts by date, drops non-finite values; a later duplicate date wins
    pub fn new(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.retain(|(_, v)| v.is_finite());
        points.sort_by_key(|(date, _)| *date);

        let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(points.len());
        for (date, value) in points {
            match deduped.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => deduped.push((date, value)),
            }
        }
        Self { points: deduped }
    }

    /// Closing prices of a price history
    pub fn from_history(history: &PriceHistory) -> Self {
        Self::new(history.bars().iter().map(|bar| (bar.date, bar.close)).collect())
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Ratio `numerator / denominator` on the numerator's dates.
///
/// The denominator is forward-filled (resampled daily) over its own span, so
/// only numerator dates inside that span are kept. Days with a zero
/// denominator are dropped. Disjoint or empty inputs give an empty series.
pub fn align_daily(numerator: &DatedSeries, denominator: &DatedSeries) -> DatedSeries {
    let (Some((den_start, _)), Some((den_end, _))) = (denominator.first(), denominator.last()) else {
        return DatedSeries::default();
    };

    let den = denominator.points();
    let mut idx = 0;
    let mut current = None;

    let points = numerator
        .points()
        .iter()
        .filter(|(date, _)| *date >= den_start && *date <= den_end)
        .filter_map(|&(date, value)| {
            while idx < den.len() && den[idx].0 <= date {
                current = Some(den[idx].1);
                idx += 1;
            }
            let divisor = current?;
            (divisor != 0.0).then(|| (date, value / divisor))
        })
        .collect();

    DatedSeries { points }
}

/// Z-score of the last value against the trailing `window` values (itself included).
///
/// Uses the sample standard deviation. `None` when fewer than `min_periods`
/// values are available or the deviation is zero.
pub fn rolling_zscore(values: &[f64], window: usize, min_periods: usize) -> Option<f64> {
    let last = *values.last()?;
    let window = window.max(1);
    let start = values.len().saturating_sub(window);
    let sample = &values[start..];

    if sample.len() < min_periods.max(2) {
        return None;
    }

    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let variance = sample.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    (std.is_finite() && std > 0.0).then(|| (last - mean) / std)
}
