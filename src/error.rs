//! Error types for the spend_forecast crate

use thiserror::Error;

/// Custom error types for the spend_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough history to run the requested path. This is a normal
    /// state, not a failure: callers route it to the fallback estimator.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Numeric or runtime failure while fitting the regression model
    #[error("Training failure: {0}")]
    TrainingFailure(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ForecastError {
    /// Whether this error is the benign "not enough history" state
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ForecastError::InsufficientData(_))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
