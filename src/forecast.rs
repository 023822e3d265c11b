//! Prediction types and the shaping rules applied to every forecast list

use crate::evaluation::FitReport;
use serde::{Deserialize, Serialize};

/// Percentage change above which a prediction is classified as trending up
pub const TREND_UP_THRESHOLD: i32 = 5;
/// Percentage change below which a prediction is classified as trending down
pub const TREND_DOWN_THRESHOLD: i32 = -5;

/// Direction of predicted spending relative to the current period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Which path produced a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    /// Trained regression model
    Model,
    /// Moving-average fallback estimator
    Fallback,
}

/// One per-category spending prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Category name
    pub category: String,
    /// Predicted next-period spending; always non-negative after shaping
    pub predicted_amount: f64,
    /// Confidence score in [0, 100]
    pub confidence: u8,
    /// Direction relative to the current period
    pub trend: Trend,
    /// Signed percentage change vs the current period's actual spending
    pub percentage_change: i32,
}

/// A complete forecast: the shaped prediction list plus summary metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    /// Shaped per-category predictions, sorted descending by amount
    pub predictions: Vec<Prediction>,
    /// Whether the model or the fallback produced the numbers
    pub source: ForecastSource,
    /// Set when the model path failed and the fallback covered for it.
    /// Advisory only; the predictions are still usable.
    pub degraded: bool,
    /// Sum of all predicted amounts
    pub total_predicted: f64,
    /// Mean confidence across predictions, 0 when the list is empty
    pub average_confidence: u8,
    /// Fit metrics when the model path produced this report
    pub fit: Option<FitReport>,
    /// Days of expense history backing this forecast
    pub days_of_data: i64,
}

impl ForecastReport {
    /// Build a report from a shaped prediction list
    pub fn new(
        predictions: Vec<Prediction>,
        source: ForecastSource,
        degraded: bool,
        fit: Option<FitReport>,
        days_of_data: i64,
    ) -> Self {
        let total_predicted = predictions.iter().map(|p| p.predicted_amount).sum();
        let average_confidence = if predictions.is_empty() {
            0
        } else {
            let sum: u32 = predictions.iter().map(|p| p.confidence as u32).sum();
            (sum as f64 / predictions.len() as f64).round() as u8
        };

        Self {
            predictions,
            source,
            degraded,
            total_predicted,
            average_confidence,
            fit,
            days_of_data,
        }
    }

    /// An empty report for when even the fallback has nothing to work with
    pub fn not_enough_data(days_of_data: i64) -> Self {
        Self::new(Vec::new(), ForecastSource::Fallback, false, None, days_of_data)
    }

    /// Whether the report carries any predictions at all
    pub fn has_predictions(&self) -> bool {
        !self.predictions.is_empty()
    }
}

/// Signed percentage change of `predicted` relative to `actual`.
///
/// Zero when there is no current-period spending to compare against.
pub fn percentage_change(predicted: f64, actual: f64) -> i32 {
    if actual > 0.0 {
        (100.0 * (predicted - actual) / actual).round() as i32
    } else {
        0
    }
}

/// Classify a percentage change into a trend direction
pub fn classify_trend(change: i32) -> Trend {
    if change > TREND_UP_THRESHOLD {
        Trend::Up
    } else if change < TREND_DOWN_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Shape a raw prediction list for presentation.
///
/// Drops non-positive amounts, sorts descending by predicted amount, and
/// caps the list length. Applied uniformly to model and fallback output.
pub fn shape_predictions(mut predictions: Vec<Prediction>, cap: usize) -> Vec<Prediction> {
    predictions.retain(|p| p.predicted_amount > 0.0);
    predictions.sort_by(|a, b| {
        b.predicted_amount
            .partial_cmp(&a.predicted_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    predictions.truncate(cap);
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(category: &str, amount: f64) -> Prediction {
        Prediction {
            category: category.to_string(),
            predicted_amount: amount,
            confidence: 60,
            trend: Trend::Stable,
            percentage_change: 0,
        }
    }

    #[test]
    fn shaping_drops_sorts_and_caps() {
        let raw = vec![
            prediction("a", 10.0),
            prediction("b", 0.0),
            prediction("c", 30.0),
            prediction("d", -4.0),
            prediction("e", 20.0),
        ];

        let shaped = shape_predictions(raw, 2);
        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].category, "c");
        assert_eq!(shaped[1].category, "e");
    }

    #[test]
    fn percentage_change_guards_zero_actual() {
        assert_eq!(percentage_change(50.0, 0.0), 0);
        assert_eq!(percentage_change(110.0, 100.0), 10);
        assert_eq!(percentage_change(90.0, 100.0), -10);
    }

    #[test]
    fn trend_classification_uses_five_percent_band() {
        assert_eq!(classify_trend(6), Trend::Up);
        assert_eq!(classify_trend(5), Trend::Stable);
        assert_eq!(classify_trend(-5), Trend::Stable);
        assert_eq!(classify_trend(-6), Trend::Down);
    }

    #[test]
    fn report_summarizes_totals_and_confidence() {
        let report = ForecastReport::new(
            vec![prediction("a", 10.0), prediction("b", 30.0)],
            ForecastSource::Model,
            false,
            None,
            90,
        );

        assert_eq!(report.total_predicted, 40.0);
        assert_eq!(report.average_confidence, 60);
        assert!(report.has_predictions());
    }

    #[test]
    fn empty_report_has_zero_confidence() {
        let report = ForecastReport::not_enough_data(0);
        assert_eq!(report.average_confidence, 0);
        assert!(!report.has_predictions());
    }
}
