//! End-to-end tests: raw transactions through training, prediction and the
//! orchestrated report.

use chrono::NaiveDate;
use spend_forecast::data::{TransactionKind, TransactionRecord};
use spend_forecast::models::{network, NetworkConfig};
use spend_forecast::orchestrator::{ForecastConfig, SpendingForecaster};
use spend_forecast::forecast::ForecastSource;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(id: &str, amount: f64, category: &str, d: NaiveDate) -> TransactionRecord {
    TransactionRecord::new(id, TransactionKind::Expense, amount, category, d).unwrap()
}

/// Six months of seasonal spending across four categories
fn household_history() -> Vec<TransactionRecord> {
    let mut records = Vec::new();
    let mut id = 0;
    for month in 1..=6u32 {
        let seasonal = (month % 3) as f64 * 15.0;
        for (category, base) in [
            ("groceries", 320.0),
            ("dining", 140.0),
            ("transport", 90.0),
            ("entertainment", 60.0),
        ] {
            for week in 0..4u32 {
                id += 1;
                records.push(expense(
                    &format!("tx-{}", id),
                    base / 4.0 + seasonal + week as f64,
                    category,
                    date(2025, month, week * 7 + 1),
                ));
            }
        }
    }
    records
}

fn quick_network() -> NetworkConfig {
    NetworkConfig {
        hidden: [16, 8, 4],
        epochs: 80,
        ..NetworkConfig::default()
    }
}

#[test]
fn train_then_predict_round_trip() {
    let history = household_history();
    let model = network::train(&history, &quick_network(), 15).unwrap();

    assert_eq!(model.category_order().len(), 4);
    assert_eq!(model.fit_report().example_count, 5);

    // Predicting on the training data itself is a sanity check, not an
    // exactness claim: training is stochastic
    let predictions = model.predict(&history).unwrap();
    assert_eq!(predictions.len(), 4);
    for p in &predictions {
        assert!(p.predicted_amount >= 0.0);
        assert!(p.predicted_amount.is_finite());
    }
}

#[tokio::test]
async fn orchestrated_forecast_carries_summary_metrics() {
    let config = ForecastConfig {
        network: quick_network(),
        ..ForecastConfig::default()
    };
    let forecaster = SpendingForecaster::new(config).unwrap();
    let report = forecaster
        .refresh(household_history(), date(2025, 6, 25))
        .await
        .unwrap();

    assert_eq!(report.source, ForecastSource::Model);
    assert!(report.total_predicted > 0.0);
    assert!(report.average_confidence >= 50);
    assert!(report.days_of_data >= 30);

    let fit = report.fit.unwrap();
    assert!(fit.mae.is_finite());
    assert!(fit.r_squared <= 1.0);
}

#[tokio::test]
async fn report_serializes_for_the_caller() {
    let config = ForecastConfig {
        network: quick_network(),
        ..ForecastConfig::default()
    };
    let forecaster = SpendingForecaster::new(config).unwrap();
    let report = forecaster
        .refresh(household_history(), date(2025, 6, 25))
        .await
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"source\":\"model\""));

    let parsed: spend_forecast::ForecastReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.predictions.len(), report.predictions.len());
    assert_eq!(parsed.total_predicted, report.total_predicted);
}

#[tokio::test]
async fn growing_history_switches_from_fallback_to_model() {
    let config = ForecastConfig {
        network: quick_network(),
        ..ForecastConfig::default()
    };
    let forecaster = SpendingForecaster::new(config).unwrap();

    // First month only: below the 30-day threshold
    let early: Vec<TransactionRecord> = household_history()
        .into_iter()
        .filter(|r| r.date < date(2025, 1, 20))
        .collect();
    let report = forecaster.refresh(early, date(2025, 1, 20)).await.unwrap();
    assert_eq!(report.source, ForecastSource::Fallback);

    // Full history: model path takes over and installs a model
    let report = forecaster
        .refresh(household_history(), date(2025, 6, 25))
        .await
        .unwrap();
    assert_eq!(report.source, ForecastSource::Model);
    assert!(forecaster.has_model());
}
