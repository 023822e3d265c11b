//! Transaction data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of a transaction. Only expenses participate in forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single transaction record, supplied by the caller and read-only here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Caller-assigned identifier
    pub id: String,
    /// Income or expense
    pub kind: TransactionKind,
    /// Non-negative amount in the caller's currency
    pub amount: f64,
    /// Free-form category name
    pub category: String,
    /// Calendar date of the transaction
    pub date: NaiveDate,
}

impl TransactionRecord {
    /// Create a validated transaction record
    pub fn new(
        id: impl Into<String>,
        kind: TransactionKind,
        amount: f64,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Transaction amount must be a non-negative number, got {}",
                amount
            )));
        }

        let category = category.into();
        if category.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Transaction category must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: id.into(),
            kind,
            amount,
            category,
            date,
        })
    }

    /// Whether this record participates in expense forecasting
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// Canonical `YYYY-MM` period key for a date
pub fn period_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Filter a transaction list down to the expense records
pub fn expenses(records: &[TransactionRecord]) -> Vec<&TransactionRecord> {
    records.iter().filter(|r| r.is_expense()).collect()
}

/// Days covered by the expense history, measured from the earliest expense
/// record up to the supplied reference date. Zero when there are no expenses
/// or when every record is dated after the reference.
pub fn days_of_history(records: &[TransactionRecord], now: NaiveDate) -> i64 {
    records
        .iter()
        .filter(|r| r.is_expense())
        .map(|r| r.date)
        .min()
        .map(|earliest| (now - earliest).num_days().max(0))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_negative_amounts() {
        let result = TransactionRecord::new(
            "t1",
            TransactionKind::Expense,
            -5.0,
            "Groceries",
            date(2026, 3, 1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_category() {
        let result =
            TransactionRecord::new("t1", TransactionKind::Expense, 5.0, "", date(2026, 3, 1));
        assert!(result.is_err());
    }

    #[test]
    fn period_key_is_zero_padded() {
        assert_eq!(period_key(date(2026, 3, 7)), "2026-03");
        assert_eq!(period_key(date(2025, 12, 31)), "2025-12");
    }

    #[test]
    fn history_span_ignores_income() {
        let records = vec![
            TransactionRecord::new("i1", TransactionKind::Income, 100.0, "Salary", date(2026, 1, 1))
                .unwrap(),
            TransactionRecord::new(
                "e1",
                TransactionKind::Expense,
                20.0,
                "Groceries",
                date(2026, 2, 1),
            )
            .unwrap(),
        ];

        assert_eq!(days_of_history(&records, date(2026, 2, 11)), 10);
    }

    #[test]
    fn history_span_is_zero_when_empty() {
        assert_eq!(days_of_history(&[], date(2026, 2, 11)), 0);
    }
}
