//! # Spend Forecast
//!
//! A Rust library for forecasting next-month per-category personal spending
//! from raw transaction history.
//!
//! ## Features
//!
//! - Monthly windowing of transactions into supervised training examples
//! - A small feed-forward regression network (64-32-16 hidden units)
//! - Fit-quality evaluation (MAE, R², confidence scoring)
//! - A moving-average fallback estimator that always produces something
//! - A debounced async orchestrator with last-write-wins retraining
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use spend_forecast::models;
//! use spend_forecast::{ForecastConfig, SpendingForecaster, TransactionRecord};
//!
//! # fn load_transactions() -> Vec<TransactionRecord> { Vec::new() }
//! # async fn run() {
//! let transactions = load_transactions();
//! let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
//!
//! // One-shot: train and predict directly
//! if let Ok(model) = models::train(&transactions) {
//!     let predictions = model.predict(&transactions).unwrap();
//!     for p in predictions {
//!         println!("{}: {:.2} ({}% confident)", p.category, p.predicted_amount, p.confidence);
//!     }
//! }
//!
//! // Session-style: debounced retraining behind an orchestrator
//! let forecaster = SpendingForecaster::new(ForecastConfig::default()).unwrap();
//! let _report = forecaster.refresh(transactions, today).await;
//! # }
//! ```
//!
//! Forecasting is a value-add feature: every failure path degrades to the
//! fallback estimator or an empty-but-valid report, never a hard error to
//! the caller.

pub mod data;
pub mod error;
pub mod evaluation;
pub mod forecast;
pub mod models;
pub mod orchestrator;
pub mod scaling;
pub mod windowing;

// Re-export commonly used types
pub use crate::data::{TransactionKind, TransactionRecord};
pub use crate::error::ForecastError;
pub use crate::evaluation::FitReport;
pub use crate::forecast::{ForecastReport, ForecastSource, Prediction, Trend};
pub use crate::models::{ExpenseModel, NetworkConfig, TrainedNetwork};
pub use crate::orchestrator::{ForecastConfig, ForecastState, SpendingForecaster};
pub use crate::scaling::Scaler;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
