//! Shared telemetry engine
//!
//! Wraps the [`SampleStore`] in a reader/writer lock so one producer loop can
//! ingest while any number of display threads query. Each query holds the
//! read lock for its whole computation, so multi-day aggregates see a single
//! consistent snapshot and never a partially pruned store.
//!
//! ```
//! use chrono::NaiveDate;
//! use pulse_ledger::TelemetryEngine;
//!
//! let engine = TelemetryEngine::new();
//! let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! engine.add_heart_rate(100.0, day.and_hms_opt(9, 0, 0).unwrap());
//! engine.add_steps(10_000, day.and_hms_opt(18, 0, 0).unwrap());
//! assert_eq!(engine.activity_score(day), Some(100.0));
//! ```

use crate::config::EngineConfig;
use crate::daily::DailyAggregator;
use crate::error::TelemetryError;
use crate::schema::{ProducerEvent, SleepPayload, TelemetryReading, TelemetryType};
use crate::score::ActivityScorer;
use crate::sleep::SleepAggregator;
use crate::store::{PruneOutcome, SampleStore};
use crate::trend::WeeklyTrendAnalyzer;
use crate::types::{
    DailyHeartRateStats, DailyReport, DailyStepsTotal, SampleCounts, SleepRecord, SleepSummary,
    WeeklyTrend,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// What an ingested event turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    HeartRate,
    /// Step reading, with the reconciled total for its day
    Steps { daily_total: i64 },
    Sleep,
    /// Telemetry kind with no local aggregate
    Skipped(TelemetryType),
}

/// Per-kind tally of a batch ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub heart_rate: usize,
    pub steps: usize,
    pub sleep: usize,
    pub skipped: usize,
}

impl IngestSummary {
    fn record(&mut self, ingested: Ingested) {
        match ingested {
            Ingested::HeartRate => self.heart_rate += 1,
            Ingested::Steps { .. } => self.steps += 1,
            Ingested::Sleep => self.sleep += 1,
            Ingested::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Thread-safe local telemetry aggregation engine
#[derive(Debug, Default)]
pub struct TelemetryEngine {
    store: RwLock<SampleStore>,
    config: EngineConfig,
}

impl TelemetryEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            store: RwLock::new(SampleStore::new()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // The store holds plain data with no cross-field invariant a panicking
    // holder could break, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, SampleStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SampleStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    // Ingestion

    pub fn add_heart_rate(&self, value: f64, timestamp: NaiveDateTime) {
        self.write().add_heart_rate(value, timestamp);
        log::debug!("heart rate {value} at {timestamp}");
    }

    /// Reconcile a raw step reading; returns the day's new total
    pub fn add_steps(&self, raw: i64, timestamp: NaiveDateTime) -> i64 {
        let total = self.write().add_steps(raw, timestamp);
        log::debug!("steps {raw} at {timestamp}, day total {total}");
        total
    }

    pub fn add_sleep_record(&self, record: SleepRecord) {
        log::debug!(
            "sleep record {} ({} min)",
            record.date,
            record.total_sleep_minutes
        );
        self.write().add_sleep_record(record);
    }

    /// Validate and ingest one sensor reading
    pub fn ingest(&self, reading: &TelemetryReading) -> Result<Ingested, TelemetryError> {
        reading.validate()?;
        let ingested = match reading.telemetry_type {
            TelemetryType::HeartRate => {
                self.add_heart_rate(reading.value, reading.timestamp);
                Ingested::HeartRate
            }
            TelemetryType::Steps => Ingested::Steps {
                daily_total: self.add_steps(reading.step_count(), reading.timestamp),
            },
            other => {
                log::debug!("no local aggregate for {}, skipping", other.as_str());
                Ingested::Skipped(other)
            }
        };
        Ok(ingested)
    }

    /// Validate and ingest a sleep payload
    pub fn ingest_sleep(&self, payload: SleepPayload) -> Result<Ingested, TelemetryError> {
        self.add_sleep_record(payload.into_record()?);
        Ok(Ingested::Sleep)
    }

    pub fn ingest_event(&self, event: ProducerEvent) -> Result<Ingested, TelemetryError> {
        match event {
            ProducerEvent::Telemetry(reading) => self.ingest(&reading),
            ProducerEvent::Sleep(payload) => self.ingest_sleep(payload),
        }
    }

    /// Ingest events in order, stopping at the first invalid one
    pub fn ingest_events(
        &self,
        events: impl IntoIterator<Item = ProducerEvent>,
    ) -> Result<IngestSummary, TelemetryError> {
        let mut summary = IngestSummary::default();
        for event in events {
            summary.record(self.ingest_event(event)?);
        }
        Ok(summary)
    }

    // Retention

    /// Remove samples older than `days_to_keep` days before the current local time
    pub fn prune_older_than(&self, days_to_keep: u32) -> PruneOutcome {
        self.prune_older_than_at(days_to_keep, Local::now().naive_local())
    }

    pub fn prune_older_than_at(&self, days_to_keep: u32, now: NaiveDateTime) -> PruneOutcome {
        self.write()
            .prune_older_than(days_to_keep, now, self.config.prune_step_accumulator)
    }

    /// Prune with the configured retention window
    pub fn prune_expired(&self) -> PruneOutcome {
        self.prune_older_than(self.config.retention_days)
    }

    pub fn prune_expired_at(&self, now: NaiveDateTime) -> PruneOutcome {
        self.prune_older_than_at(self.config.retention_days, now)
    }

    /// Forget per-day running totals; daily step totals are then taken from
    /// the largest retained observation of each day
    pub fn clear_step_accumulator(&self) {
        self.write().clear_step_accumulator();
    }

    // Queries

    pub fn daily_heart_rate_stats(&self, date: NaiveDate) -> Option<DailyHeartRateStats> {
        DailyAggregator::heart_rate_stats(&self.read(), date)
    }

    pub fn daily_steps_total(&self, date: NaiveDate) -> Option<DailyStepsTotal> {
        DailyAggregator::steps_total(&self.read(), date)
    }

    pub fn weekly_heart_rate_trend(&self, start: NaiveDate) -> Option<WeeklyTrend> {
        WeeklyTrendAnalyzer::heart_rate(&self.read(), start)
    }

    pub fn weekly_steps_trend(&self, start: NaiveDate) -> Option<WeeklyTrend> {
        WeeklyTrendAnalyzer::steps(&self.read(), start)
    }

    /// Summary of the `days` most recent sleep records
    pub fn sleep_statistics(&self, days: usize) -> Option<SleepSummary> {
        SleepAggregator::statistics(&self.read(), days)
    }

    /// Sleep summary over the configured period
    pub fn recent_sleep_statistics(&self) -> Option<SleepSummary> {
        self.sleep_statistics(self.config.sleep_period_days)
    }

    pub fn activity_score(&self, date: NaiveDate) -> Option<f64> {
        ActivityScorer::score(&self.read(), date)
    }

    /// Heart rate, steps and activity score for one day from a single snapshot
    pub fn daily_report(&self, date: NaiveDate) -> DailyReport {
        let store = self.read();
        let heart_rate = DailyAggregator::heart_rate_stats(&store, date);
        let steps = DailyAggregator::steps_total(&store, date);
        let activity_score = match (&heart_rate, &steps) {
            (Some(hr), Some(st)) => Some(ActivityScorer::from_aggregates(hr, st)),
            _ => None,
        };
        DailyReport {
            date,
            heart_rate,
            steps,
            activity_score,
        }
    }

    pub fn sample_counts(&self) -> SampleCounts {
        self.read().counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_ingest_routes_by_type() {
        let engine = TelemetryEngine::new();
        assert_eq!(
            engine.ingest(&TelemetryReading::heart_rate(70.0, at(9, 0))).unwrap(),
            Ingested::HeartRate
        );
        assert_eq!(
            engine.ingest(&TelemetryReading::steps(5.9, at(9, 1))).unwrap(),
            Ingested::Steps { daily_total: 5 }
        );
        assert_eq!(
            engine
                .ingest(&TelemetryReading::new(TelemetryType::Calories, 300.0, at(9, 2)))
                .unwrap(),
            Ingested::Skipped(TelemetryType::Calories)
        );
        assert_eq!(
            engine.sample_counts(),
            SampleCounts {
                heart_rate_samples: 1,
                step_observations: 1,
                step_days: 1,
                sleep_records: 0,
            }
        );
    }

    #[test]
    fn test_ingest_rejects_invalid_values() {
        let engine = TelemetryEngine::new();
        let err = engine
            .ingest(&TelemetryReading::steps(f64::INFINITY, at(9, 0)))
            .unwrap_err();
        assert!(matches!(err, TelemetryError::Validation(_)));
        assert_eq!(engine.sample_counts(), SampleCounts::default());
    }

    #[test]
    fn test_ingest_sleep_validates_payload() {
        let engine = TelemetryEngine::new();
        let payload = SleepPayload {
            date: "2024-01-15".to_string(),
            total_sleep_minutes: 420,
            deep_sleep_minutes: 84,
            light_sleep_minutes: 294,
            awake_minutes: 42,
            sleep_quality: Some(101.0),
            start_time: None,
            end_time: None,
        };
        assert!(engine.ingest_sleep(payload.clone()).is_err());

        let payload = SleepPayload {
            sleep_quality: Some(85.0),
            ..payload
        };
        assert_eq!(engine.ingest_sleep(payload).unwrap(), Ingested::Sleep);
        assert_eq!(engine.recent_sleep_statistics().unwrap().avg_quality, Some(85.0));
    }

    #[test]
    fn test_ingest_events_summary() {
        let engine = TelemetryEngine::new();
        let events = vec![
            ProducerEvent::Telemetry(TelemetryReading::heart_rate(70.0, at(9, 0))),
            ProducerEvent::Telemetry(TelemetryReading::steps(10.0, at(9, 0))),
            ProducerEvent::Telemetry(TelemetryReading::new(TelemetryType::Weight, 70.0, at(9, 0))),
        ];
        let summary = engine.ingest_events(events).unwrap();
        assert_eq!(
            summary,
            IngestSummary {
                heart_rate: 1,
                steps: 1,
                sleep: 0,
                skipped: 1,
            }
        );
    }

    #[test]
    fn test_daily_report_matches_individual_queries() {
        let engine = TelemetryEngine::new();
        engine.add_heart_rate(80.0, at(8, 0));
        engine.add_steps(2_000, at(8, 30));

        let report = engine.daily_report(day());
        assert_eq!(report.heart_rate, engine.daily_heart_rate_stats(day()));
        assert_eq!(report.steps, engine.daily_steps_total(day()));
        assert_eq!(report.activity_score, engine.activity_score(day()));
        assert_eq!(report.activity_score, Some(35.0));
    }

    #[test]
    fn test_reads_are_idempotent() {
        let engine = TelemetryEngine::new();
        engine.add_heart_rate(64.0, at(7, 0));
        engine.add_steps(300, at(7, 0));
        engine.add_steps(100, at(8, 0));

        assert_eq!(engine.daily_steps_total(day()), engine.daily_steps_total(day()));
        assert_eq!(engine.weekly_steps_trend(day()), engine.weekly_steps_trend(day()));
        assert_eq!(engine.daily_report(day()), engine.daily_report(day()));
        assert_eq!(engine.sample_counts().step_observations, 2);
    }

    #[test]
    fn test_prune_expired_uses_config() {
        let engine = TelemetryEngine::with_config(EngineConfig {
            retention_days: 1,
            ..EngineConfig::default()
        });
        engine.add_heart_rate(70.0, at(9, 0));
        engine.add_heart_rate(72.0, at(20, 0));

        let outcome = engine.prune_expired_at(at(12, 0) + chrono::Duration::days(1));
        assert_eq!(outcome.heart_rate_removed, 1);
        assert_eq!(engine.daily_heart_rate_stats(day()).unwrap().count, 1);
    }

    #[test]
    fn test_clear_step_accumulator_falls_back() {
        let engine = TelemetryEngine::new();
        engine.add_steps(40, at(9, 0));
        engine.add_steps(10, at(9, 5));
        engine.clear_step_accumulator();
        assert_eq!(engine.daily_steps_total(day()).unwrap().total_steps, 50);
    }
}
