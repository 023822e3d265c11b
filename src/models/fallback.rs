//! Moving-average fallback estimator.
//!
//! Used when the history is too thin for the regression network or when
//! training fails. Guaranteed to produce something usable: given at least
//! one expense record it yields predictions, and given none it yields an
//! empty list rather than an error.

use crate::data::{days_of_history, TransactionRecord};
use crate::forecast::{Prediction, Trend};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Record count above which the fallback calls a category trending up
const TREND_UP_MIN_RECORDS: usize = 5;
/// Record count below which the fallback calls a category trending down
const TREND_DOWN_MAX_RECORDS: usize = 3;

/// Fallback confidence never exceeds this; a simple average is never as
/// trustworthy as a converged model
const MAX_FALLBACK_CONFIDENCE: f64 = 90.0;

/// Predicts next-month spending per category from simple monthly averages
#[derive(Debug, Clone, Default)]
pub struct FallbackEstimator;

impl FallbackEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate next-month spending for every observed category.
    ///
    /// Each category's prediction is its total spend divided by the months
    /// of history coverage. Confidence grows with history length, capped at
    /// 90. The trend is a record-count heuristic (many observations reads as
    /// rising activity, few as falling) rather than a statistical trend; it
    /// is kept deliberately simple.
    pub fn estimate(&self, records: &[TransactionRecord], now: NaiveDate) -> Vec<Prediction> {
        let days_span = days_of_history(records, now);
        let months_of_coverage = (days_span as f64 / 30.0).max(1.0);
        let confidence = (50.0 + days_span as f64 / 3.0).min(MAX_FALLBACK_CONFIDENCE).round() as u8;

        let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for record in records.iter().filter(|r| r.is_expense()) {
            let entry = totals.entry(record.category.as_str()).or_insert((0.0, 0));
            entry.0 += record.amount;
            entry.1 += 1;
        }

        if !totals.is_empty() {
            log::debug!(
                "Fallback estimate over {} categories, {} days of history",
                totals.len(),
                days_span
            );
        }

        totals
            .into_iter()
            .map(|(category, (total, count))| Prediction {
                category: category.to_string(),
                predicted_amount: (total / months_of_coverage).round(),
                confidence,
                trend: Self::trend_heuristic(count),
                percentage_change: 0,
            })
            .collect()
    }

    fn trend_heuristic(record_count: usize) -> Trend {
        if record_count > TREND_UP_MIN_RECORDS {
            Trend::Up
        } else if record_count < TREND_DOWN_MAX_RECORDS {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}
