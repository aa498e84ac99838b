//! Activity score
//!
//! Combines a day's average heart rate and step total into one number with a
//! nominal 0-100 range. Neither the heart-rate component nor the sum is
//! clamped, so scores below 0 or above 100 are valid results.

use crate::daily::DailyAggregator;
use crate::store::SampleStore;
use crate::types::{round_to, DailyHeartRateStats, DailyStepsTotal};
use chrono::NaiveDate;

/// Heart rate that scores zero (bpm)
pub const RESTING_HEART_RATE_BPM: f64 = 60.0;

/// Heart-rate span above rest that is worth a full component (bpm)
pub const HEART_RATE_SPAN_BPM: f64 = 40.0;

/// Step count that is worth a full component
pub const DAILY_STEP_GOAL: f64 = 10_000.0;

/// Points available to each component
pub const COMPONENT_POINTS: f64 = 50.0;

/// Scores a day's activity
pub struct ActivityScorer;

impl ActivityScorer {
    /// Activity score for `date`, or `None` unless both heart rate and steps
    /// are available for that day
    pub fn score(store: &SampleStore, date: NaiveDate) -> Option<f64> {
        let heart_rate = DailyAggregator::heart_rate_stats(store, date)?;
        let steps = DailyAggregator::steps_total(store, date)?;
        Some(Self::from_aggregates(&heart_rate, &steps))
    }

    /// Score already-computed daily aggregates
    pub fn from_aggregates(heart_rate: &DailyHeartRateStats, steps: &DailyStepsTotal) -> f64 {
        let hr_score = heart_rate_component(heart_rate.avg);
        let steps_score = steps_component(steps.total_steps);
        round_to(hr_score + steps_score, 1)
    }
}

fn heart_rate_component(avg_bpm: f64) -> f64 {
    (avg_bpm - RESTING_HEART_RATE_BPM) / HEART_RATE_SPAN_BPM * COMPONENT_POINTS
}

/// Capped at full points; negative totals are left as they are
fn steps_component(total_steps: i64) -> f64 {
    (total_steps as f64 / DAILY_STEP_GOAL * COMPONENT_POINTS).min(COMPONENT_POINTS)
}
