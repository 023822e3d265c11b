use chrono::NaiveDate;
use spend_forecast::data::{TransactionKind, TransactionRecord};
use spend_forecast::orchestrator::{ForecastConfig, SpendingForecaster};

fn sample_history() -> Vec<TransactionRecord> {
    let mut records = Vec::new();
    let mut id = 0;
    for month in 1..=5u32 {
        for (category, base) in [("groceries", 310.0), ("dining", 120.0), ("transport", 85.0)] {
            for week in 0..4u32 {
                id += 1;
                let date = NaiveDate::from_ymd_opt(2025, month, week * 7 + 2).unwrap();
                let amount = base / 4.0 + (month % 3) as f64 * 8.0 + week as f64;
                records.push(
                    TransactionRecord::new(
                        format!("tx-{}", id),
                        TransactionKind::Expense,
                        amount,
                        category,
                        date,
                    )
                    .unwrap(),
                );
            }
        }
    }
    records
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transactions = sample_history();
    let today = NaiveDate::from_ymd_opt(2025, 5, 28).unwrap();
    println!("Loaded {} transactions", transactions.len());

    let forecaster = SpendingForecaster::new(ForecastConfig::default())?;
    let report = forecaster
        .refresh(transactions, today)
        .await
        .expect("forecasting enabled");

    println!(
        "Forecast ({:?} path, {} days of data):",
        report.source, report.days_of_data
    );
    for p in &report.predictions {
        println!(
            "  {:<14} {:>8.2}  confidence {:>3}%  trend {:?} ({:+}%)",
            p.category, p.predicted_amount, p.confidence, p.trend, p.percentage_change
        );
    }
    println!(
        "Total predicted: {:.2} (average confidence {}%)",
        report.total_predicted, report.average_confidence
    );

    if let Some(fit) = report.fit {
        println!("Model fit: MAE {:.2}, R² {:.3}", fit.mae, fit.r_squared);
    }

    Ok(())
}
