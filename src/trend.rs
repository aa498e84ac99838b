//! Weekly trend analysis
//!
//! Compares the early and late part of a 7-day span. Only days that produced
//! a value take part; missing days are skipped rather than zero-filled.

use crate::daily::{mean, DailyAggregator};
use crate::store::SampleStore;
use crate::types::{round_to, WeeklyTrend};
use chrono::{Duration, NaiveDate};

/// Days covered by a trend window
pub const TREND_WINDOW_DAYS: i64 = 7;

/// Entries taken from each end once at least this many days have data
const HALF_WINDOW_LEN: usize = 3;

/// Minimum number of days with data for a trend
const MIN_DAYS_WITH_DATA: usize = 2;

/// Computes early-vs-late trends over a 7-day window
pub struct WeeklyTrendAnalyzer;

impl WeeklyTrendAnalyzer {
    /// Trend of daily average heart rate over `[start, start + 6 days]`
    pub fn heart_rate(store: &SampleStore, start: NaiveDate) -> Option<WeeklyTrend> {
        let daily = collect_window(start, |date| {
            DailyAggregator::heart_rate_stats(store, date).map(|s| s.avg)
        });
        compare_halves(start, &daily)
    }

    /// Trend of daily step totals over `[start, start + 6 days]`
    pub fn steps(store: &SampleStore, start: NaiveDate) -> Option<WeeklyTrend> {
        let daily: Vec<i64> = collect_window(start, |date| {
            DailyAggregator::steps_total(store, date).map(|s| s.total_steps)
        });
        let as_f64: Vec<f64> = daily.iter().map(|&steps| steps as f64).collect();

        let mut trend = compare_halves(start, &as_f64)?;
        trend.total_steps_week = Some(
            daily
                .iter()
                .fold(0i64, |total, &steps| total.saturating_add(steps)),
        );
        Some(trend)
    }
}

/// Evaluate `f` for each day of the window, keeping only days with a value
fn collect_window<T>(start: NaiveDate, f: impl Fn(NaiveDate) -> Option<T>) -> Vec<T> {
    (0..TREND_WINDOW_DAYS)
        .filter_map(|offset| f(start + Duration::days(offset)))
        .collect()
}

/// Split daily values into an early and a late window.
///
/// With three or more values the windows are the first and last three
/// entries, which overlap when fewer than six days have data. With two
/// values the list is split in the middle.
fn split_halves(values: &[f64]) -> (&[f64], &[f64]) {
    if values.len() >= HALF_WINDOW_LEN {
        (
            &values[..HALF_WINDOW_LEN],
            &values[values.len() - HALF_WINDOW_LEN..],
        )
    } else {
        values.split_at(values.len() / 2)
    }
}

fn compare_halves(start: NaiveDate, values: &[f64]) -> Option<WeeklyTrend> {
    if values.len() < MIN_DAYS_WITH_DATA {
        return None;
    }

    let (first, second) = split_halves(values);
    let first_avg = mean(first)?;
    let second_avg = mean(second)?;

    if first_avg == 0.0 {
        return None;
    }

    let trend_percent = (second_avg - first_avg) / first_avg * 100.0;

    Some(WeeklyTrend {
        start_date: start,
        first_half_avg: round_to(first_avg, 2),
        second_half_avg: round_to(second_avg, 2),
        trend_percent: round_to(trend_percent, 2),
        days_with_data: values.len(),
        total_steps_week: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()
    }

    fn noon(offset: i64) -> NaiveDateTime {
        (start() + Duration::days(offset)).and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
    }

    #[test]
    fn test_split_halves() {
        let seven = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(split_halves(&seven), (&seven[..3], &seven[4..]));

        // Three to five entries overlap
        let four = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(split_halves(&four), (&four[..3], &four[1..]));

        let two = [1.0, 2.0];
        assert_eq!(split_halves(&two), (&two[..1], &two[1..]));
    }

    #[test]
    fn test_heart_rate_trend_full_week() {
        let mut store = SampleStore::new();
        for (offset, bpm) in [60.0, 62.0, 64.0, 66.0, 68.0, 70.0, 72.0].into_iter().enumerate() {
            store.add_heart_rate(bpm, noon(offset as i64));
        }

        let trend = WeeklyTrendAnalyzer::heart_rate(&store, start()).unwrap();
        assert_eq!(trend.first_half_avg, 62.0);
        assert_eq!(trend.second_half_avg, 70.0);
        assert_eq!(trend.trend_percent, 12.9);
        assert_eq!(trend.days_with_data, 7);
        assert_eq!(trend.total_steps_week, None);
    }

    #[test]
    fn test_trend_needs_two_days() {
        let mut store = SampleStore::new();
        store.add_heart_rate(70.0, noon(3));
        assert_eq!(WeeklyTrendAnalyzer::heart_rate(&store, start()), None);
        assert_eq!(WeeklyTrendAnalyzer::steps(&store, start()), None);
    }

    #[test]
    fn test_trend_two_days_splits_in_middle() {
        let mut store = SampleStore::new();
        store.add_heart_rate(80.0, noon(0));
        store.add_heart_rate(60.0, noon(6));

        let trend = WeeklyTrendAnalyzer::heart_rate(&store, start()).unwrap();
        assert_eq!(trend.first_half_avg, 80.0);
        assert_eq!(trend.second_half_avg, 60.0);
        assert_eq!(trend.trend_percent, -25.0);
    }

    #[test]
    fn test_trend_ignores_days_outside_window() {
        let mut store = SampleStore::new();
        store.add_heart_rate(200.0, noon(-1));
        store.add_heart_rate(70.0, noon(0));
        store.add_heart_rate(77.0, noon(1));
        store.add_heart_rate(10.0, noon(7));

        let trend = WeeklyTrendAnalyzer::heart_rate(&store, start()).unwrap();
        assert_eq!(trend.days_with_data, 2);
        assert_eq!(trend.trend_percent, 10.0);
    }

    #[test]
    fn test_steps_trend_reports_week_total() {
        let mut store = SampleStore::new();
        for (offset, steps) in [(0, 4_000), (2, 5_000), (4, 6_000), (6, 8_000)] {
            store.add_steps(steps, noon(offset));
        }

        let trend = WeeklyTrendAnalyzer::steps(&store, start()).unwrap();
        assert_eq!(trend.days_with_data, 4);
        assert_eq!(trend.first_half_avg, 5_000.0);
        assert_eq!(trend.second_half_avg, 6_333.33);
        assert_eq!(trend.trend_percent, 26.67);
        assert_eq!(trend.total_steps_week, Some(23_000));
    }

    #[test]
    fn test_week_total_saturates() {
        let mut store = SampleStore::new();
        store.add_steps(i64::MAX, noon(0));
        store.add_steps(i64::MAX, noon(1));

        let trend = WeeklyTrendAnalyzer::steps(&store, start()).unwrap();
        assert_eq!(trend.total_steps_week, Some(i64::MAX));
        assert_eq!(trend.trend_percent, 0.0);
    }

    #[test]
    fn test_zero_baseline_has_no_trend() {
        let mut store = SampleStore::new();
        for offset in 0..3 {
            store.add_steps(0, noon(offset));
        }
        store.add_steps(500, noon(5));
        assert_eq!(WeeklyTrendAnalyzer::steps(&store, start()), None);
    }
}
