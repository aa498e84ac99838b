//! Daily aggregation
//!
//! Per-day heart-rate statistics and step totals computed from the sample
//! store on every call.

use crate::store::SampleStore;
use crate::types::{DailyHeartRateStats, DailyStepsTotal};
use chrono::NaiveDate;

/// Computes per-day aggregates from a [`SampleStore`]
pub struct DailyAggregator;

impl DailyAggregator {
    /// Heart-rate statistics for `date`, or `None` if the day has no samples
    pub fn heart_rate_stats(store: &SampleStore, date: NaiveDate) -> Option<DailyHeartRateStats> {
        let values: Vec<f64> = store.heart_rate_on(date).collect();
        if values.is_empty() {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(DailyHeartRateStats {
            date,
            count: values.len(),
            min,
            max,
            avg: mean(&values)?,
            median: median(&values)?,
        })
    }

    /// Step total for `date`.
    ///
    /// Uses the day's running total when the accumulator has one, otherwise
    /// the largest observation inside the day window. `samples_count` always
    /// counts the window's observations.
    pub fn steps_total(store: &SampleStore, date: NaiveDate) -> Option<DailyStepsTotal> {
        let samples_count = store.steps_on(date).count();

        let total_steps = match store.step_total(date) {
            Some(total) => total,
            None => store.steps_on(date).map(|s| s.daily_total).max()?,
        };

        Some(DailyStepsTotal {
            date,
            total_steps,
            samples_count,
        })
    }
}

/// Arithmetic mean
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; the two middle values are averaged for even lengths
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
