//! Sleep aggregation
//!
//! Summarizes the most recent N sleep records by date. This is a record count,
//! not a calendar window: gaps or duplicate dates change how many nights are
//! covered.

use crate::store::SampleStore;
use crate::types::{round_to, SleepRecord, SleepSummary};

/// Default number of records summarized
pub const DEFAULT_SLEEP_PERIOD_DAYS: usize = 7;

/// Summarizes recent sleep records
pub struct SleepAggregator;

impl SleepAggregator {
    pub fn statistics(store: &SampleStore, days: usize) -> Option<SleepSummary> {
        summarize(store.sleep_records(), days)
    }
}

fn summarize(records: &[SleepRecord], days: usize) -> Option<SleepSummary> {
    if records.is_empty() {
        return None;
    }

    let mut recent: Vec<&SleepRecord> = records.iter().collect();
    // Stable sort keeps insertion order among records sharing a date
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(days);

    if recent.is_empty() {
        return None;
    }

    let count = recent.len() as f64;
    let total: Vec<i64> = recent.iter().map(|r| r.total_sleep_minutes).collect();
    let deep_sum: i64 = recent.iter().map(|r| r.deep_sleep_minutes).sum();

    let qualities: Vec<f64> = recent
        .iter()
        .filter_map(|r| r.sleep_quality)
        .filter(|&q| q != 0.0)
        .collect();
    let avg_quality = if qualities.is_empty() {
        None
    } else {
        Some(round_to(
            qualities.iter().sum::<f64>() / qualities.len() as f64,
            1,
        ))
    };

    Some(SleepSummary {
        period_days: days,
        records_count: recent.len(),
        avg_total_sleep: round_to(total.iter().sum::<i64>() as f64 / count, 1),
        avg_deep_sleep: round_to(deep_sum as f64 / count, 1),
        avg_quality,
        min_total_sleep: total.iter().copied().min()?,
        max_total_sleep: total.iter().copied().max()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(date: &str, total: i64, deep: i64, quality: Option<f64>) -> SleepRecord {
        SleepRecord {
            date: date.to_string(),
            total_sleep_minutes: total,
            deep_sleep_minutes: deep,
            light_sleep_minutes: total - deep,
            awake_minutes: 30,
            sleep_quality: quality,
            start_time: None,
            end_time: None,
        }
    }

    #[test]
    fn test_no_records() {
        let store = SampleStore::new();
        assert_eq!(SleepAggregator::statistics(&store, 7), None);
    }

    #[test]
    fn test_summary_of_all_records() {
        let mut store = SampleStore::new();
        store.add_sleep_record(record("2024-01-01", 420, 84, Some(85.0)));
        store.add_sleep_record(record("2024-01-02", 390, 70, Some(80.0)));
        store.add_sleep_record(record("2024-01-03", 455, 91, None));

        let summary = SleepAggregator::statistics(&store, 7).unwrap();
        assert_eq!(
            summary,
            SleepSummary {
                period_days: 7,
                records_count: 3,
                avg_total_sleep: 421.7,
                avg_deep_sleep: 81.7,
                avg_quality: Some(82.5),
                min_total_sleep: 390,
                max_total_sleep: 455,
            }
        );
    }

    #[test]
    fn test_takes_most_recent_by_date() {
        let mut store = SampleStore::new();
        store.add_sleep_record(record("2024-01-10", 500, 100, None));
        store.add_sleep_record(record("2024-01-01", 300, 50, None));
        store.add_sleep_record(record("2024-01-05", 400, 80, None));

        let summary = SleepAggregator::statistics(&store, 2).unwrap();
        assert_eq!(summary.records_count, 2);
        assert_eq!(summary.min_total_sleep, 400);
        assert_eq!(summary.max_total_sleep, 500);
        assert_eq!(summary.avg_total_sleep, 450.0);
    }

    #[test]
    fn test_averages_round_ties_to_even() {
        let mut store = SampleStore::new();
        for (day, total, deep, quality) in [
            ("2024-01-01", 10, 3, 80.0),
            ("2024-01-02", 11, 3, 80.5),
            ("2024-01-03", 10, 3, 80.0),
            ("2024-01-04", 10, 4, 80.5),
        ] {
            store.add_sleep_record(record(day, total, deep, Some(quality)));
        }

        let summary = SleepAggregator::statistics(&store, 7).unwrap();
        // 10.25, 3.25 and 80.25 before rounding
        assert_eq!(summary.avg_total_sleep, 10.2);
        assert_eq!(summary.avg_deep_sleep, 3.2);
        assert_eq!(summary.avg_quality, Some(80.2));
    }

    #[test]
    fn test_duplicate_dates_keep_insertion_order() {
        let mut store = SampleStore::new();
        store.add_sleep_record(record("2024-01-05", 400, 80, None));
        store.add_sleep_record(record("2024-01-01", 300, 60, None));
        store.add_sleep_record(record("2024-01-05", 480, 95, None));

        // Both 01-05 records outrank 01-01; the first one inserted wins the cut
        let summary = SleepAggregator::statistics(&store, 1).unwrap();
        assert_eq!(summary.records_count, 1);
        assert_eq!(summary.avg_total_sleep, 400.0);

        // A duplicate pushes the older night out of the selection
        let summary = SleepAggregator::statistics(&store, 2).unwrap();
        assert_eq!(summary.min_total_sleep, 400);
        assert_eq!(summary.max_total_sleep, 480);
    }

    #[test]
    fn test_zero_quality_is_excluded() {
        let mut store = SampleStore::new();
        store.add_sleep_record(record("2024-01-01", 420, 84, Some(0.0)));
        store.add_sleep_record(record("2024-01-02", 420, 84, Some(90.0)));
        let summary = SleepAggregator::statistics(&store, 7).unwrap();
        assert_eq!(summary.avg_quality, Some(90.0));

        let mut store = SampleStore::new();
        store.add_sleep_record(record("2024-01-01", 420, 84, Some(0.0)));
        let summary = SleepAggregator::statistics(&store, 7).unwrap();
        assert_eq!(summary.avg_quality, None);
    }

    #[test]
    fn test_zero_day_period_selects_nothing() {
        let mut store = SampleStore::new();
        store.add_sleep_record(record("2024-01-01", 420, 84, None));
        assert_eq!(SleepAggregator::statistics(&store, 0), None);
    }
}
