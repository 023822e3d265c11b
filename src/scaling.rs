//! Single-factor feature scaling for training stability.
//!
//! The whole training set shares one scalar: the maximum amount observed
//! across all input and target vectors. Amounts are mapped into [0, 1] for
//! training and mapped back on output. The factor is captured once per run
//! and reused for every prediction against that model, never recomputed.

use crate::windowing::TrainingSet;
use serde::{Deserialize, Serialize};

/// Scales raw amounts into [0, 1] and back using a single captured factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    factor: f64,
}

impl Scaler {
    /// Capture the scaling factor from a training set.
    ///
    /// Falls back to 1.0 when every value is zero, so division is always safe.
    pub fn fit(training_set: &TrainingSet) -> Self {
        let max = training_set.all_values().fold(0.0_f64, f64::max);
        Self {
            factor: if max > 0.0 { max } else { 1.0 },
        }
    }

    /// The captured scaling factor; always strictly positive
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Map a raw amount vector into the normalized [0, 1] range
    pub fn normalize(&self, vector: &[f64]) -> Vec<f64> {
        vector.iter().map(|v| v / self.factor).collect()
    }

    /// Map a normalized vector back to raw amounts
    pub fn denormalize(&self, vector: &[f64]) -> Vec<f64> {
        vector.iter().map(|v| v * self.factor).collect()
    }
}
