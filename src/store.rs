//! Sample store
//!
//! Holds raw heart-rate samples, reconciled step observations, the per-day
//! step accumulator and sleep records. The store itself has no locking;
//! [`crate::engine::TelemetryEngine`] wraps it for shared use.

use crate::reconciler::StepAccumulator;
use crate::types::{HeartRateSample, SampleCounts, SleepRecord, StepObservation};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Retention window used when no explicit value is configured
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Date assumed for sleep records whose date cannot be parsed.
/// Old enough that such records are always eligible for pruning.
const UNPARSABLE_SLEEP_DATE: (i32, u32, u32) = (2000, 1, 1);

/// Half-open `[start, end)` window covering one calendar day
pub fn day_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

/// What a prune pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneOutcome {
    pub cutoff: Option<NaiveDateTime>,
    pub heart_rate_removed: usize,
    pub steps_removed: usize,
    pub step_days_removed: usize,
    pub sleep_removed: usize,
}

/// In-memory store of raw telemetry
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    heart_rate: Vec<HeartRateSample>,
    steps: Vec<StepObservation>,
    accumulator: StepAccumulator,
    sleep: Vec<SleepRecord>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a heart-rate sample. Values are not range-checked.
    pub fn add_heart_rate(&mut self, value: f64, timestamp: NaiveDateTime) {
        self.heart_rate.push(HeartRateSample { timestamp, value });
    }

    /// Reconcile a raw step reading into its day's running total and record
    /// the resulting observation. Returns the new daily total.
    pub fn add_steps(&mut self, raw: i64, timestamp: NaiveDateTime) -> i64 {
        let daily_total = self.accumulator.reconcile(timestamp.date(), raw);
        self.steps.push(StepObservation {
            timestamp,
            daily_total,
        });
        daily_total
    }

    pub fn add_sleep_record(&mut self, record: SleepRecord) {
        self.sleep.push(record);
    }

    pub fn heart_rate_samples(&self) -> &[HeartRateSample] {
        &self.heart_rate
    }

    pub fn step_observations(&self) -> &[StepObservation] {
        &self.steps
    }

    pub fn sleep_records(&self) -> &[SleepRecord] {
        &self.sleep
    }

    /// Current reconciled total for a day, if the accumulator has one
    pub fn step_total(&self, date: NaiveDate) -> Option<i64> {
        self.accumulator.get(date)
    }

    /// Heart-rate values recorded inside the day window, in insertion order
    pub fn heart_rate_on(&self, date: NaiveDate) -> impl Iterator<Item = f64> + '_ {
        let (start, end) = day_window(date);
        self.heart_rate
            .iter()
            .filter(move |s| s.timestamp >= start && s.timestamp < end)
            .map(|s| s.value)
    }

    /// Step observations recorded inside the day window, in insertion order
    pub fn steps_on(&self, date: NaiveDate) -> impl Iterator<Item = &StepObservation> + '_ {
        let (start, end) = day_window(date);
        self.steps
            .iter()
            .filter(move |s| s.timestamp >= start && s.timestamp < end)
    }

    /// Drop every per-day running total, leaving observations in place.
    ///
    /// Daily step totals then fall back to scanning the observations.
    pub fn clear_step_accumulator(&mut self) {
        self.accumulator.clear();
    }

    pub fn counts(&self) -> SampleCounts {
        SampleCounts {
            heart_rate_samples: self.heart_rate.len(),
            step_observations: self.steps.len(),
            step_days: self.accumulator.len(),
            sleep_records: self.sleep.len(),
        }
    }

    /// Remove data older than `days_to_keep` days before `now`.
    ///
    /// Heart-rate and step samples are cut at the exact instant; sleep
    /// records (and, when `prune_accumulator` is set, step running totals)
    /// are cut by calendar date. A window reaching back past the earliest
    /// representable instant keeps everything.
    pub fn prune_older_than(
        &mut self,
        days_to_keep: u32,
        now: NaiveDateTime,
        prune_accumulator: bool,
    ) -> PruneOutcome {
        let Some(cutoff) = Duration::try_days(i64::from(days_to_keep))
            .and_then(|window| now.checked_sub_signed(window))
        else {
            log::debug!("retention of {days_to_keep} days reaches past {now}, nothing pruned");
            return PruneOutcome::default();
        };
        let cutoff_date = cutoff.date();

        let hr_before = self.heart_rate.len();
        self.heart_rate.retain(|s| s.timestamp >= cutoff);

        let steps_before = self.steps.len();
        self.steps.retain(|s| s.timestamp >= cutoff);

        let step_days_removed = if prune_accumulator {
            self.accumulator.retain_from(cutoff_date)
        } else {
            0
        };

        let sleep_before = self.sleep.len();
        self.sleep
            .retain(|record| sleep_record_date(record) >= cutoff_date);

        let outcome = PruneOutcome {
            cutoff: Some(cutoff),
            heart_rate_removed: hr_before - self.heart_rate.len(),
            steps_removed: steps_before - self.steps.len(),
            step_days_removed,
            sleep_removed: sleep_before - self.sleep.len(),
        };
        log::debug!(
            "pruned before {cutoff}: {} heart rate, {} steps, {} step days, {} sleep",
            outcome.heart_rate_removed,
            outcome.steps_removed,
            outcome.step_days_removed,
            outcome.sleep_removed
        );
        outcome
    }
}

fn sleep_record_date(record: &SleepRecord) -> NaiveDate {
    record.calendar_date().unwrap_or_else(|| {
        log::warn!(
            "sleep record has unparsable date {:?}, treating it as stale",
            record.date
        );
        let (y, m, d) = UNPARSABLE_SLEEP_DATE;
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    })
}
