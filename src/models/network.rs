//! Feed-forward regression network for per-category spending prediction.
//!
//! Maps a normalized per-category aggregate vector for one month to the
//! predicted vector for the next month, through hidden layers of 64, 32 and
//! 16 units with ReLU activations, dropout after the first two hidden layers
//! during training, and a sigmoid output consistent with inputs scaled to
//! [0, 1]. Fitting minimizes mean squared error with Adam.
//!
//! Training is inherently stochastic: weight init and dropout masks are
//! random, so repeated runs on identical data produce slightly different
//! weights. Inference is deterministic.

use crate::data::TransactionRecord;
use crate::error::{ForecastError, Result};
use crate::evaluation::{
    display_confidence, mean_absolute_error, model_confidence, r_squared, FitReport,
};
use crate::forecast::{classify_trend, percentage_change, Prediction};
use crate::scaling::Scaler;
use crate::windowing::{aggregate_vector, build_training_set, TrainingSet};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// Hyperparameters for the regression network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Hidden layer widths
    pub hidden: [usize; 3],
    /// Dropout rate applied after the first two hidden layers while training
    pub dropout: f64,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Fixed training budget in epochs
    pub epochs: usize,
    /// Fraction of examples held out for validation loss tracking
    pub validation_split: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden: [64, 32, 16],
            dropout: 0.2,
            learning_rate: 0.01,
            epochs: 200,
            validation_split: 0.2,
        }
    }
}

impl NetworkConfig {
    /// Validate the configuration, returning it unchanged when sound
    pub fn validated(self) -> Result<Self> {
        if self.hidden.iter().any(|&w| w == 0) {
            return Err(ForecastError::InvalidParameter(
                "Hidden layer widths must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::InvalidParameter(
                "Dropout rate must be in [0, 1)".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(ForecastError::InvalidParameter(
                "Learning rate must be positive".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(ForecastError::InvalidParameter(
                "Epoch budget must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ForecastError::InvalidParameter(
                "Validation split must be in [0, 1)".to_string(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    fn apply(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        }
    }
}

/// One fully-connected layer
#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    biases: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    fn new<R: Rng>(fan_in: usize, fan_out: usize, activation: Activation, rng: &mut R) -> Self {
        // He init for ReLU layers, Xavier-style for the sigmoid output
        let std = match activation {
            Activation::Relu => (2.0 / fan_in as f64).sqrt(),
            Activation::Sigmoid => (1.0 / fan_in as f64).sqrt(),
        };
        let normal = Normal::new(0.0, std).expect("finite std");

        Self {
            weights: Array2::from_shape_fn((fan_in, fan_out), |_| normal.sample(rng)),
            biases: Array1::zeros(fan_out),
            activation,
        }
    }

    fn pre_activation(&self, input: &Array2<f64>) -> Array2<f64> {
        input.dot(&self.weights) + &self.biases
    }
}

/// Adam optimizer state for one layer
struct AdamState {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

impl AdamState {
    fn new(layer: &DenseLayer) -> Self {
        Self {
            m_w: Array2::zeros(layer.weights.raw_dim()),
            v_w: Array2::zeros(layer.weights.raw_dim()),
            m_b: Array1::zeros(layer.biases.raw_dim()),
            v_b: Array1::zeros(layer.biases.raw_dim()),
        }
    }

    fn step(
        &mut self,
        layer: &mut DenseLayer,
        grad_w: &Array2<f64>,
        grad_b: &Array1<f64>,
        t: i32,
        learning_rate: f64,
    ) {
        let bc1 = 1.0 - ADAM_BETA1.powi(t);
        let bc2 = 1.0 - ADAM_BETA2.powi(t);

        self.m_w = &self.m_w * ADAM_BETA1 + &(grad_w * (1.0 - ADAM_BETA1));
        self.v_w = &self.v_w * ADAM_BETA2 + &(grad_w.mapv(|g| g * g) * (1.0 - ADAM_BETA2));
        let step_w = self.m_w.mapv(|m| m / bc1)
            / (self.v_w.mapv(|v| (v / bc2).sqrt()) + ADAM_EPSILON);
        layer.weights = &layer.weights - &(step_w * learning_rate);

        self.m_b = &self.m_b * ADAM_BETA1 + &(grad_b * (1.0 - ADAM_BETA1));
        self.v_b = &self.v_b * ADAM_BETA2 + &(grad_b.mapv(|g| g * g) * (1.0 - ADAM_BETA2));
        let step_b = self.m_b.mapv(|m| m / bc1)
            / (self.v_b.mapv(|v| (v / bc2).sqrt()) + ADAM_EPSILON);
        layer.biases = &layer.biases - &(step_b * learning_rate);
    }
}

/// A trained regression network, ready for deterministic inference.
///
/// Owns its parameter buffers outright; dropping the value (or calling
/// [`TrainedNetwork::dispose`]) releases them. The orchestrator holds
/// exactly one of these at a time and replaces it on retrain.
#[derive(Debug, Clone)]
pub struct TrainedNetwork {
    layers: Vec<DenseLayer>,
    category_order: Vec<String>,
    scaler: Scaler,
    fit: FitReport,
}

impl TrainedNetwork {
    /// Category ordering fixed at training time; indexes every vector
    pub fn category_order(&self) -> &[String] {
        &self.category_order
    }

    /// Scaling factor captured at training time
    pub fn scaling_factor(&self) -> f64 {
        self.scaler.factor()
    }

    /// Fit-quality metrics from the training run
    pub fn fit_report(&self) -> &FitReport {
        &self.fit
    }

    /// Display-clamped confidence for this model's predictions
    pub fn confidence(&self) -> u8 {
        display_confidence(model_confidence(self.fit.example_count, self.fit.r_squared))
    }

    /// Forward pass without dropout; one normalized vector in, one out
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut a = Array2::from_shape_vec((1, input.len()), input.to_vec())
            .expect("row vector shape");
        for layer in &self.layers {
            a = layer.activation.apply(&layer.pre_activation(&a));
        }
        a.row(0).to_vec()
    }

    /// Predict next-period spending per category from the current period's
    /// transactions.
    ///
    /// Deterministic: the same model and the same transactions always yield
    /// the same predictions. The returned list is unshaped (one entry per
    /// trained category); callers apply presentation shaping.
    pub fn predict(&self, current_period: &[TransactionRecord]) -> Result<Vec<Prediction>> {
        let actual = aggregate_vector(current_period, &self.category_order);
        let output = self.forward(&self.scaler.normalize(&actual));
        let amounts = self.scaler.denormalize(&output);
        let confidence = self.confidence();

        let predictions = self
            .category_order
            .iter()
            .zip(amounts.iter().zip(actual.iter()))
            .map(|(category, (&predicted, &current))| {
                let change = percentage_change(predicted, current);
                Prediction {
                    category: category.clone(),
                    predicted_amount: predicted,
                    confidence,
                    trend: classify_trend(change),
                    percentage_change: change,
                }
            })
            .collect();

        Ok(predictions)
    }

    /// Explicitly release the model's parameter buffers.
    ///
    /// Dropping the value gives the same guarantee; this method exists so
    /// call sites can make the release visible.
    pub fn dispose(self) {
        log::debug!("Disposing trained network ({} categories)", self.category_order.len());
    }
}

/// Window the records, fit the network, and evaluate it
pub fn train(
    records: &[TransactionRecord],
    config: &NetworkConfig,
    min_records: usize,
) -> Result<TrainedNetwork> {
    let config = config.validated()?;
    let training_set = build_training_set(records, min_records)?;
    let scaler = Scaler::fit(&training_set);
    fit_network(&training_set, scaler, &config)
}

fn to_matrix(vectors: Vec<Vec<f64>>, width: usize) -> Result<Array2<f64>> {
    let rows = vectors.len();
    let flat: Vec<f64> = vectors.into_iter().flatten().collect();
    Array2::from_shape_vec((rows, width), flat).map_err(|e| {
        ForecastError::TrainingFailure(format!("Could not assemble training matrix: {}", e))
    })
}

fn mse(predicted: &Array2<f64>, target: &Array2<f64>) -> f64 {
    let diff = predicted - target;
    diff.mapv(|d| d * d).mean().unwrap_or(f64::NAN)
}

fn fit_network(
    training_set: &TrainingSet,
    scaler: Scaler,
    config: &NetworkConfig,
) -> Result<TrainedNetwork> {
    let width = training_set.width();
    let n = training_set.examples.len();

    let x = to_matrix(
        training_set
            .examples
            .iter()
            .map(|ex| scaler.normalize(&ex.input))
            .collect(),
        width,
    )?;
    let y = to_matrix(
        training_set
            .examples
            .iter()
            .map(|ex| scaler.normalize(&ex.target))
            .collect(),
        width,
    )?;

    // Hold out ~20% for validation loss tracking; skip when the set is too
    // small to spare any examples.
    let holdout = (n as f64 * config.validation_split).floor() as usize;
    let (train_idx, val_idx): (Vec<usize>, Vec<usize>) = if holdout >= 1 && n - holdout >= 2 {
        ((0..n - holdout).collect(), (n - holdout..n).collect())
    } else {
        ((0..n).collect(), Vec::new())
    };

    let mut rng = rand::thread_rng();
    let mut layers = vec![
        DenseLayer::new(width, config.hidden[0], Activation::Relu, &mut rng),
        DenseLayer::new(config.hidden[0], config.hidden[1], Activation::Relu, &mut rng),
        DenseLayer::new(config.hidden[1], config.hidden[2], Activation::Relu, &mut rng),
        DenseLayer::new(config.hidden[2], width, Activation::Sigmoid, &mut rng),
    ];
    let mut adam: Vec<AdamState> = layers.iter().map(AdamState::new).collect();

    let batch_size = (train_idx.len() / 2).max(2);
    let mut shuffled = train_idx.clone();
    let mut step: i32 = 0;
    let mut final_loss = f64::NAN;

    for epoch in 0..config.epochs {
        shuffled.shuffle(&mut rng);
        let mut epoch_loss = 0.0;
        let mut batches = 0;

        for chunk in shuffled.chunks(batch_size) {
            let xb = x.select(Axis(0), chunk);
            let yb = y.select(Axis(0), chunk);

            // Forward pass, caching layer inputs, pre-activations and
            // dropout masks for backprop.
            let mut inputs: Vec<Array2<f64>> = Vec::with_capacity(layers.len());
            let mut pre_acts: Vec<Array2<f64>> = Vec::with_capacity(layers.len());
            let mut masks: Vec<Option<Array2<f64>>> = vec![None; layers.len()];
            let mut a = xb.clone();

            for (i, layer) in layers.iter().enumerate() {
                inputs.push(a.clone());
                let z = layer.pre_activation(&a);
                let mut out = layer.activation.apply(&z);
                pre_acts.push(z);

                // Inverted dropout after the first two hidden layers
                if i < 2 && config.dropout > 0.0 {
                    let keep = 1.0 - config.dropout;
                    let mask = Array2::from_shape_fn(out.raw_dim(), |_| {
                        if rng.gen::<f64>() < keep { 1.0 / keep } else { 0.0 }
                    });
                    out = &out * &mask;
                    masks[i] = Some(mask);
                }
                a = out;
            }

            let loss = mse(&a, &yb);
            if !loss.is_finite() {
                return Err(ForecastError::TrainingFailure(format!(
                    "Loss diverged at epoch {}",
                    epoch
                )));
            }
            epoch_loss += loss;
            batches += 1;

            // Backward pass
            let rows = xb.nrows() as f64;
            let mut delta = (&a - &yb) * (2.0 / (rows * width as f64));

            for i in (0..layers.len()).rev() {
                if let Some(mask) = &masks[i] {
                    delta = &delta * mask;
                }
                let dz = match layers[i].activation {
                    Activation::Relu => {
                        &delta * &pre_acts[i].mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
                    }
                    Activation::Sigmoid => {
                        let act = layers[i].activation.apply(&pre_acts[i]);
                        &delta * &act.mapv(|v| v * (1.0 - v))
                    }
                };
                let grad_w = inputs[i].t().dot(&dz);
                let grad_b = dz.sum_axis(Axis(0));
                delta = dz.dot(&layers[i].weights.t());

                step += 1;
                adam[i].step(&mut layers[i], &grad_w, &grad_b, step, config.learning_rate);
            }
        }

        final_loss = epoch_loss / batches as f64;

        if epoch % 50 == 0 && !val_idx.is_empty() {
            let xv = x.select(Axis(0), &val_idx);
            let yv = y.select(Axis(0), &val_idx);
            let mut av = xv;
            for layer in &layers {
                av = layer.activation.apply(&layer.pre_activation(&av));
            }
            log::debug!(
                "Epoch {}: train loss {:.6}, validation loss {:.6}",
                epoch,
                final_loss,
                mse(&av, &yv)
            );
        }
    }

    let network = TrainedNetwork {
        layers,
        category_order: training_set.category_order.clone(),
        scaler,
        fit: FitReport {
            mae: 0.0,
            r_squared: 0.0,
            training_error: final_loss,
            example_count: n,
        },
    };

    evaluate(network, training_set)
}

/// Compute the fit report from training residuals on denormalized values
fn evaluate(mut network: TrainedNetwork, training_set: &TrainingSet) -> Result<TrainedNetwork> {
    let mut predicted = Vec::new();
    let mut actual = Vec::new();

    for example in &training_set.examples {
        let output = network.forward(&network.scaler.normalize(&example.input));
        predicted.extend(network.scaler.denormalize(&output));
        actual.extend(example.target.iter().copied());
    }

    network.fit.mae = mean_absolute_error(&predicted, &actual)?;
    network.fit.r_squared = r_squared(&predicted, &actual)?;

    log::info!(
        "Trained network on {} examples, {} categories: MAE {:.2}, R² {:.3}",
        training_set.examples.len(),
        training_set.category_order.len(),
        network.fit.mae,
        network.fit.r_squared
    );

    Ok(network)
}
