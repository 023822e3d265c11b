//! Forecast orchestration: decides between the model and fallback paths,
//! debounces retraining, and owns the single trained-model slot.
//!
//! State machine: `Idle -> Evaluating -> {Training | fallback} -> Ready`.
//! Transaction-set changes are coalesced by a debounce window, and a
//! generation counter gives last-write-wins semantics: a training run whose
//! generation has been superseded discards its result instead of installing
//! a stale model.

use crate::data::{days_of_history, period_key, TransactionRecord};
use crate::error::Result;
use crate::forecast::{shape_predictions, ForecastReport, ForecastSource, Prediction};
use crate::models::{ExpenseModel, FallbackEstimator, NetworkConfig, NetworkTrainer, TrainedNetwork};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Minimum days of expense history before model training is attempted
pub const DEFAULT_MIN_HISTORY_DAYS: i64 = 30;
/// Minimum expense records before model training is attempted
pub const DEFAULT_MIN_EXPENSE_RECORDS: usize = 15;
/// Maximum predictions in a model-path forecast list
pub const DEFAULT_MAX_PREDICTIONS: usize = 6;
/// Maximum predictions in the condensed insight list
pub const DEFAULT_MAX_INSIGHT_PREDICTIONS: usize = 4;
/// Quiet period before a transaction-set change triggers re-evaluation
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Caller-supplied configuration for the orchestrator.
///
/// All thresholds are explicit; nothing is read from ambient state.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Master switch for the forecasting feature
    pub enabled: bool,
    /// Days of history required for the model path (default 30)
    pub min_history_days: i64,
    /// Expense records required for the model path (default 15)
    pub min_expense_records: usize,
    /// Cap on the forecast list (default 6); presentation choice, not numeric
    pub max_predictions: usize,
    /// Cap on the condensed insight list (default 4)
    pub max_insight_predictions: usize,
    /// Debounce window for change notifications (default 1s)
    pub debounce: Duration,
    /// Network hyperparameters for the default trainer
    pub network: NetworkConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_history_days: DEFAULT_MIN_HISTORY_DAYS,
            min_expense_records: DEFAULT_MIN_EXPENSE_RECORDS,
            max_predictions: DEFAULT_MAX_PREDICTIONS,
            max_insight_predictions: DEFAULT_MAX_INSIGHT_PREDICTIONS,
            debounce: DEFAULT_DEBOUNCE,
            network: NetworkConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Validate the configuration, returning it unchanged when sound
    pub fn validated(self) -> Result<Self> {
        if self.min_expense_records == 0 {
            return Err(crate::error::ForecastError::InvalidParameter(
                "Minimum expense records must be positive".to_string(),
            ));
        }
        if self.max_predictions == 0 || self.max_insight_predictions == 0 {
            return Err(crate::error::ForecastError::InvalidParameter(
                "Prediction caps must be positive".to_string(),
            ));
        }
        if self.min_history_days < 0 {
            return Err(crate::error::ForecastError::InvalidParameter(
                "Minimum history days must not be negative".to_string(),
            ));
        }
        let network = self.network.validated()?;
        Ok(Self { network, ..self })
    }
}

/// Observable orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastState {
    /// No evaluation in progress and no change pending
    Idle,
    /// Checking whether the history supports the model path
    Evaluating,
    /// Fitting the regression network
    Training,
    /// A forecast report is available
    Ready,
}

struct Inner {
    config: ForecastConfig,
    trainer: Box<dyn ExpenseModel>,
    fallback: FallbackEstimator,
    /// Bumped on every change notification; stale cycles compare and bail
    generation: AtomicU64,
    /// The single trained-model slot. Replacing the contents drops the
    /// superseded model and releases its parameter buffers.
    model_slot: Mutex<Option<TrainedNetwork>>,
    report: Mutex<Option<ForecastReport>>,
    state_tx: watch::Sender<ForecastState>,
    /// Keeps the state channel open so sends apply even with no subscribers
    _state_rx: watch::Receiver<ForecastState>,
}

/// Drives the forecasting feature for one user session.
///
/// Cheap to clone; clones share the same state and model slot.
#[derive(Clone)]
pub struct SpendingForecaster {
    inner: Arc<Inner>,
}

impl SpendingForecaster {
    /// Create an orchestrator with the default network trainer
    pub fn new(config: ForecastConfig) -> Result<Self> {
        let config = config.validated()?;
        let trainer = NetworkTrainer::new(config.network, config.min_expense_records)?;
        Ok(Self::with_model(config, Box::new(trainer)))
    }

    /// Create an orchestrator with a custom model implementation.
    ///
    /// The seam exists so tests can inject failing or counting trainers.
    pub fn with_model(config: ForecastConfig, trainer: Box<dyn ExpenseModel>) -> Self {
        let (state_tx, state_rx) = watch::channel(ForecastState::Idle);
        Self {
            inner: Arc::new(Inner {
                config,
                trainer,
                fallback: FallbackEstimator::new(),
                generation: AtomicU64::new(0),
                model_slot: Mutex::new(None),
                report: Mutex::new(None),
                state_tx,
                _state_rx: state_rx,
            }),
        }
    }

    /// Current orchestrator state
    pub fn state(&self) -> ForecastState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<ForecastState> {
        self.inner.state_tx.subscribe()
    }

    /// The most recent forecast report, if any cycle has completed
    pub fn report(&self) -> Option<ForecastReport> {
        self.inner.report.lock().expect("report lock").clone()
    }

    /// The condensed insight list: the current forecast re-capped at the
    /// insight limit
    pub fn insight_predictions(&self) -> Vec<Prediction> {
        self.report()
            .map(|r| shape_predictions(r.predictions, self.inner.config.max_insight_predictions))
            .unwrap_or_default()
    }

    /// Whether a trained model currently backs the forecast
    pub fn has_model(&self) -> bool {
        self.inner.model_slot.lock().expect("model lock").is_some()
    }

    /// Notify the orchestrator that the transaction set changed.
    ///
    /// Rapid successive notifications coalesce: each bumps the generation,
    /// and only the cycle belonging to the latest generation survives the
    /// debounce window. Must be called from within a tokio runtime.
    pub fn notify_change(&self, records: Vec<TransactionRecord>, now: NaiveDate) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                // A newer change arrived during the quiet period
                return;
            }
            run_cycle(inner, records, now, generation).await;
        });
    }

    /// Run a full evaluation cycle immediately, bypassing the debounce.
    ///
    /// Returns the resulting report, or `None` when forecasting is disabled
    /// or the cycle was superseded by a concurrent change notification.
    pub async fn refresh(
        &self,
        records: Vec<TransactionRecord>,
        now: NaiveDate,
    ) -> Option<ForecastReport> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        run_cycle(Arc::clone(&self.inner), records, now, generation).await
    }

    /// Tear down the session: cancels any in-flight cycle's install and
    /// releases the current model
    pub fn teardown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(model) = self.inner.model_slot.lock().expect("model lock").take() {
            model.dispose();
        }
        self.inner.report.lock().expect("report lock").take();
        let _ = self.inner.state_tx.send(ForecastState::Idle);
    }
}

/// One evaluation cycle: threshold check, then the model or fallback path
async fn run_cycle(
    inner: Arc<Inner>,
    records: Vec<TransactionRecord>,
    now: NaiveDate,
    generation: u64,
) -> Option<ForecastReport> {
    if !inner.config.enabled {
        log::debug!("Forecasting disabled by configuration");
        return None;
    }

    let _ = inner.state_tx.send(ForecastState::Evaluating);

    let days = days_of_history(&records, now);
    let expense_count = records.iter().filter(|r| r.is_expense()).count();

    let report = if days < inner.config.min_history_days
        || expense_count < inner.config.min_expense_records
    {
        // Below thresholds: the model path is skipped entirely
        log::debug!(
            "Thresholds unmet ({} days, {} records): using fallback",
            days,
            expense_count
        );
        fallback_report(&inner, &records, now, days, false)
    } else {
        let _ = inner.state_tx.send(ForecastState::Training);
        match train_off_thread(&inner, records.clone()).await {
            Ok(model) => {
                if inner.generation.load(Ordering::SeqCst) != generation {
                    log::debug!("Discarding superseded training result");
                    model.dispose();
                    return None;
                }
                match model_report(&inner, &model, &records, now, days) {
                    Ok(report) => {
                        // Install the new model; the superseded one is dropped
                        let mut slot = inner.model_slot.lock().expect("model lock");
                        if let Some(old) = slot.replace(model) {
                            old.dispose();
                        }
                        report
                    }
                    Err(e) => {
                        log::warn!("Prediction failed after training: {}", e);
                        fallback_report(&inner, &records, now, days, true)
                    }
                }
            }
            Err(e) => {
                if e.is_insufficient_data() {
                    log::debug!("Training skipped: {}", e);
                } else {
                    log::warn!("Training failed, degrading to fallback: {}", e);
                }
                fallback_report(&inner, &records, now, days, !e.is_insufficient_data())
            }
        }
    };

    if inner.generation.load(Ordering::SeqCst) != generation {
        log::debug!("Discarding superseded forecast report");
        return None;
    }

    *inner.report.lock().expect("report lock") = Some(report.clone());
    let _ = inner.state_tx.send(ForecastState::Ready);
    Some(report)
}

/// Run the trainer on the blocking pool so the event loop stays responsive
async fn train_off_thread(
    inner: &Arc<Inner>,
    records: Vec<TransactionRecord>,
) -> Result<TrainedNetwork> {
    let trainer_inner = Arc::clone(inner);
    tokio::task::spawn_blocking(move || trainer_inner.trainer.train(&records))
        .await
        .map_err(|e| {
            crate::error::ForecastError::TrainingFailure(format!("Training task panicked: {}", e))
        })?
}

fn model_report(
    inner: &Arc<Inner>,
    model: &TrainedNetwork,
    records: &[TransactionRecord],
    now: NaiveDate,
    days: i64,
) -> Result<ForecastReport> {
    let current_key = period_key(now);
    let current_period: Vec<TransactionRecord> = records
        .iter()
        .filter(|r| period_key(r.date) == current_key)
        .cloned()
        .collect();

    let predictions = model.predict(&current_period)?;
    let shaped = shape_predictions(predictions, inner.config.max_predictions);

    Ok(ForecastReport::new(
        shaped,
        ForecastSource::Model,
        false,
        Some(*model.fit_report()),
        days,
    ))
}

fn fallback_report(
    inner: &Arc<Inner>,
    records: &[TransactionRecord],
    now: NaiveDate,
    days: i64,
    degraded: bool,
) -> ForecastReport {
    let predictions = inner.fallback.estimate(records, now);
    if predictions.is_empty() {
        let mut report = ForecastReport::not_enough_data(days);
        report.degraded = degraded;
        return report;
    }

    let shaped = shape_predictions(predictions, inner.config.max_predictions);
    ForecastReport::new(shaped, ForecastSource::Fallback, degraded, None, days)
}
