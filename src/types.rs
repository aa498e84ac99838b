//! Core types for the local telemetry engine
//!
//! Raw samples held by the store, and the derived aggregates handed to the
//! display layer. Derived types are never stored; they are recomputed on
//! every query.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single heart-rate observation (bpm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// A step observation carrying the reconciled running total for its day.
///
/// The raw producer value is consumed by reconciliation and not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepObservation {
    pub timestamp: NaiveDateTime,
    pub daily_total: i64,
}

/// One night of sleep as reported by the producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    /// Calendar date (YYYY-MM-DD), kept verbatim from the producer
    pub date: String,
    pub total_sleep_minutes: i64,
    pub deep_sleep_minutes: i64,
    pub light_sleep_minutes: i64,
    pub awake_minutes: i64,
    /// Sleep quality percentage (0-100)
    pub sleep_quality: Option<f64>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

impl SleepRecord {
    /// Parse the record date, if it is a valid ISO calendar date
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

/// Heart-rate statistics for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHeartRateStats {
    pub date: NaiveDate,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
}

/// Step total for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStepsTotal {
    pub date: NaiveDate,
    pub total_steps: i64,
    /// Observations recorded inside the day window
    pub samples_count: usize,
}

/// Early-window vs late-window comparison over a 7-day span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrend {
    pub start_date: NaiveDate,
    pub first_half_avg: f64,
    pub second_half_avg: f64,
    /// Relative change of the late window against the early one (%)
    pub trend_percent: f64,
    pub days_with_data: usize,
    /// Sum of daily step totals; only set for step trends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_steps_week: Option<i64>,
}

/// Summary of the most recent sleep records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSummary {
    pub period_days: usize,
    pub records_count: usize,
    pub avg_total_sleep: f64,
    pub avg_deep_sleep: f64,
    pub avg_quality: Option<f64>,
    pub min_total_sleep: i64,
    pub max_total_sleep: i64,
}

/// Everything the "today" panel shows for a single date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: NaiveDate,
    pub heart_rate: Option<DailyHeartRateStats>,
    pub steps: Option<DailyStepsTotal>,
    pub activity_score: Option<f64>,
}

/// Number of raw entries currently retained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleCounts {
    pub heart_rate_samples: usize,
    pub step_observations: usize,
    pub step_days: usize,
    pub sleep_records: usize,
}

/// Round to a fixed number of decimal places, sending exact ties to the
/// even digit
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
