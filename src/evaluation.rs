//! Metrics for evaluating model fit quality

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Confidence shown to users never drops below this, even for a poor fit
pub const MIN_DISPLAY_CONFIDENCE: u8 = 50;
/// Confidence shown to users never exceeds this, even for a perfect fit
pub const MAX_DISPLAY_CONFIDENCE: u8 = 95;

/// Fit-quality summary for one training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Mean absolute error over all scalar components, in raw currency units
    pub mae: f64,
    /// Coefficient of determination in (-inf, 1]; 0 for degenerate targets
    pub r_squared: f64,
    /// Final training loss (mean squared error on normalized values)
    pub training_error: f64,
    /// Number of windowed examples the model was fitted on
    pub example_count: usize,
}

/// Mean absolute error between predicted and actual values
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(ForecastError::ValidationError(
            "Predicted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Coefficient of determination (R²) between predicted and actual values.
///
/// When every actual value is identical the denominator is zero and R² is
/// undefined; that degenerate case is reported as 0.0 rather than dividing.
pub fn r_squared(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(ForecastError::ValidationError(
            "Predicted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let mean_actual: f64 = actual.iter().sum::<f64>() / actual.len() as f64;

    let ss_res: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(0.0);
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// Raw confidence score from data volume and fit quality.
///
/// Data volume saturates at 20 examples; fit quality contributes nothing
/// for negative R². Weighted 30/70 towards fit quality.
pub fn model_confidence(example_count: usize, r_squared: f64) -> u8 {
    let data_volume = (100.0 * example_count as f64 / 20.0).min(100.0);
    let fit_quality = (100.0 * r_squared).max(0.0);

    (data_volume * 0.3 + fit_quality * 0.7).round() as u8
}

/// Clamp a raw confidence score into the user-facing display band.
///
/// Predictions never claim near-zero or near-certain confidence.
pub fn display_confidence(confidence: u8) -> u8 {
    confidence.clamp(MIN_DISPLAY_CONFIDENCE, MAX_DISPLAY_CONFIDENCE)
}
