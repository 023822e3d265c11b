//! Prediction models for expense forecasting

use crate::data::TransactionRecord;
use crate::error::Result;
use std::fmt::Debug;

pub mod fallback;
pub mod network;

pub use fallback::FallbackEstimator;
pub use network::{NetworkConfig, TrainedNetwork};

/// A model that can be trained on transaction history.
///
/// The orchestrator only talks to this seam, which keeps the training path
/// swappable in tests.
pub trait ExpenseModel: Debug + Send + Sync {
    /// Train on raw transaction records, producing a ready-to-predict model.
    ///
    /// Returns `InsufficientData` when the history cannot support training
    /// and `TrainingFailure` when fitting breaks down numerically.
    fn train(&self, records: &[TransactionRecord]) -> Result<TrainedNetwork>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Trains the feed-forward regression network on windowed monthly aggregates
#[derive(Debug, Clone)]
pub struct NetworkTrainer {
    name: String,
    config: NetworkConfig,
    min_records: usize,
}

impl NetworkTrainer {
    /// Create a trainer with the given network configuration and the minimum
    /// expense-record count required before windowing is attempted
    pub fn new(config: NetworkConfig, min_records: usize) -> Result<Self> {
        let config = config.validated()?;
        Ok(Self {
            name: format!(
                "Feed-forward regressor ({}-{}-{} hidden)",
                config.hidden[0], config.hidden[1], config.hidden[2]
            ),
            config,
            min_records,
        })
    }
}

impl ExpenseModel for NetworkTrainer {
    fn train(&self, records: &[TransactionRecord]) -> Result<TrainedNetwork> {
        network::train(records, &self.config, self.min_records)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Train a forecasting model on transaction history with default settings.
///
/// Convenience entry point; equivalent to a `NetworkTrainer` built from
/// `NetworkConfig::default()` and the default 15-record minimum.
pub fn train(records: &[TransactionRecord]) -> Result<TrainedNetwork> {
    network::train(
        records,
        &NetworkConfig::default(),
        crate::orchestrator::DEFAULT_MIN_EXPENSE_RECORDS,
    )
}
