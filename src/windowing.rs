//! Builds supervised training examples from raw transaction history.
//!
//! Expenses are grouped into monthly per-category aggregates, then adjacent
//! months are paired into sliding-window examples: the aggregate vector for
//! month P predicts the vector for month P+1. The category ordering is
//! established once per run (sorted names) and shared by every example, so
//! vector index `i` always refers to the same category.

use crate::data::{period_key, TransactionRecord};
use crate::error::{ForecastError, Result};
use std::collections::BTreeMap;

/// One supervised example: month P's aggregates predicting month P+1's
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// Per-category totals for month P, in category order
    pub input: Vec<f64>,
    /// Per-category totals for month P+1, same ordering
    pub target: Vec<f64>,
}

/// A full training run's worth of windowed examples
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// Sorted, de-duplicated category names; fixes vector indexing for the run
    pub category_order: Vec<String>,
    /// Adjacent-month example pairs, chronological
    pub examples: Vec<TrainingExample>,
    /// Number of expense records the set was built from
    pub record_count: usize,
}

impl TrainingSet {
    /// Number of categories (and so the width of every vector)
    pub fn width(&self) -> usize {
        self.category_order.len()
    }

    /// Iterate over every scalar in every input and target vector
    pub fn all_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.examples
            .iter()
            .flat_map(|ex| ex.input.iter().chain(ex.target.iter()).copied())
    }
}

/// Group expense records into per-month, per-category totals.
///
/// BTreeMaps keep both the month keys and the category names sorted, which
/// is what fixes the chronological pairing and the category ordering below.
fn monthly_aggregates(
    records: &[TransactionRecord],
) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut months: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

    for record in records.iter().filter(|r| r.is_expense()) {
        let totals = months.entry(period_key(record.date)).or_default();
        *totals.entry(record.category.clone()).or_insert(0.0) += record.amount;
    }

    months
}

/// Build a windowed training set from raw transaction records.
///
/// Returns `InsufficientData` when fewer than `min_records` expense records
/// exist, or when the records cover fewer than two distinct months (no
/// adjacent pair can be formed).
pub fn build_training_set(
    records: &[TransactionRecord],
    min_records: usize,
) -> Result<TrainingSet> {
    let record_count = records.iter().filter(|r| r.is_expense()).count();
    if record_count < min_records {
        return Err(ForecastError::InsufficientData(format!(
            "Need at least {} expense records, have {}",
            min_records, record_count
        )));
    }

    let months = monthly_aggregates(records);
    if months.len() < 2 {
        return Err(ForecastError::InsufficientData(format!(
            "Need at least 2 distinct months of spending, have {}",
            months.len()
        )));
    }

    let mut category_order: Vec<String> = months
        .values()
        .flat_map(|totals| totals.keys().cloned())
        .collect();
    category_order.sort();
    category_order.dedup();

    let vector_for = |totals: &BTreeMap<String, f64>| -> Vec<f64> {
        category_order
            .iter()
            .map(|cat| totals.get(cat).copied().unwrap_or(0.0))
            .collect()
    };

    let month_totals: Vec<&BTreeMap<String, f64>> = months.values().collect();
    let examples: Vec<TrainingExample> = month_totals
        .windows(2)
        .map(|pair| TrainingExample {
            input: vector_for(pair[0]),
            target: vector_for(pair[1]),
        })
        .collect();

    log::debug!(
        "Windowed {} expense records into {} examples across {} categories",
        record_count,
        examples.len(),
        category_order.len()
    );

    Ok(TrainingSet {
        category_order,
        examples,
        record_count,
    })
}

/// Aggregate a set of records into a single vector following `category_order`.
///
/// Used at prediction time to turn the current period's expenses into a model
/// input. Categories unseen during training are ignored; categories with no
/// spending contribute an explicit 0.
pub fn aggregate_vector(records: &[TransactionRecord], category_order: &[String]) -> Vec<f64> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_expense()) {
        *totals.entry(record.category.as_str()).or_insert(0.0) += record.amount;
    }

    category_order
        .iter()
        .map(|cat| totals.get(cat.as_str()).copied().unwrap_or(0.0))
        .collect()
}
