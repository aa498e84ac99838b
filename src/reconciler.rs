//! Step reconciliation
//!
//! Producers report steps in one of two ways: a continuous pedometer sends
//! the absolute count for the day so far, a bursty producer sends the delta
//! since its last report. Each raw reading is folded into one running total
//! per calendar day:
//!
//! - first reading of the day becomes the total
//! - a reading at or above the stored total replaces it (absolute count)
//! - a reading below the stored total is added to it (delta)
//!
//! A counter reset that reports a small absolute count is therefore read as
//! a delta. The two cases cannot be told apart from the value alone.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Per-day running step totals
#[derive(Debug, Clone, Default)]
pub struct StepAccumulator {
    totals: BTreeMap<NaiveDate, i64>,
}

/// How a raw reading was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    FirstOfDay,
    Absolute,
    Delta,
}

impl StepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a raw reading into the day's total and return the new total
    pub fn reconcile(&mut self, day: NaiveDate, raw: i64) -> i64 {
        let (total, interpretation) = match self.totals.get(&day) {
            None => (raw, Interpretation::FirstOfDay),
            Some(&last) if raw >= last => (raw, Interpretation::Absolute),
            Some(&last) => (last.saturating_add(raw), Interpretation::Delta),
        };
        log::trace!("steps {day}: raw {raw} read as {interpretation:?}, total {total}");
        self.totals.insert(day, total);
        total
    }

    pub fn get(&self, day: NaiveDate) -> Option<i64> {
        self.totals.get(&day).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn clear(&mut self) {
        self.totals.clear();
    }

    /// Keep only days on or after `first_kept`; returns how many were dropped
    pub fn retain_from(&mut self, first_kept: NaiveDate) -> usize {
        let kept = self.totals.split_off(&first_kept);
        let dropped = self.totals.len();
        self.totals = kept;
        dropped
    }
}
