use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use spend_forecast::data::{TransactionKind, TransactionRecord};
use spend_forecast::windowing::{aggregate_vector, build_training_set};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(id: &str, amount: f64, category: &str, d: NaiveDate) -> TransactionRecord {
    TransactionRecord::new(id, TransactionKind::Expense, amount, category, d).unwrap()
}

/// 40 expense records across 3 categories and 3 months
fn three_month_history() -> Vec<TransactionRecord> {
    let categories = ["dining", "groceries", "transport"];
    let mut records = Vec::new();

    for month in 1..=3u32 {
        for i in 0..13 {
            let category = categories[i % 3];
            let day = (i as u32 % 27) + 1;
            records.push(expense(
                &format!("t-{}-{}", month, i),
                20.0 + (month * 10) as f64 + i as f64,
                category,
                date(2026, month, day),
            ));
        }
    }
    records.push(expense("t-extra", 15.0, "dining", date(2026, 3, 28)));

    assert_eq!(records.len(), 40);
    records
}

#[test]
fn three_months_produce_two_examples() {
    let set = build_training_set(&three_month_history(), 15).unwrap();

    assert_eq!(set.category_order.len(), 3);
    assert_eq!(set.examples.len(), 2);
    for example in &set.examples {
        assert_eq!(example.input.len(), 3);
        assert_eq!(example.target.len(), 3);
    }
}

#[test]
fn category_order_is_sorted_and_deduplicated() {
    let set = build_training_set(&three_month_history(), 15).unwrap();
    assert_eq!(set.category_order, vec!["dining", "groceries", "transport"]);
}

#[test]
fn adjacent_months_pair_input_with_target() {
    let records = vec![
        expense("a", 100.0, "dining", date(2026, 1, 5)),
        expense("b", 200.0, "dining", date(2026, 2, 5)),
        expense("c", 300.0, "dining", date(2026, 3, 5)),
    ];

    let set = build_training_set(&records, 1).unwrap();
    assert_eq!(set.examples.len(), 2);
    assert_eq!(set.examples[0].input, vec![100.0]);
    assert_eq!(set.examples[0].target, vec![200.0]);
    assert_eq!(set.examples[1].input, vec![200.0]);
    assert_eq!(set.examples[1].target, vec![300.0]);
}

#[test]
fn missing_categories_contribute_explicit_zero() {
    let records = vec![
        expense("a", 100.0, "dining", date(2026, 1, 5)),
        expense("b", 50.0, "groceries", date(2026, 2, 5)),
    ];

    let set = build_training_set(&records, 1).unwrap();
    assert_eq!(set.category_order, vec!["dining", "groceries"]);
    assert_eq!(set.examples[0].input, vec![100.0, 0.0]);
    assert_eq!(set.examples[0].target, vec![0.0, 50.0]);
}

#[test]
fn too_few_records_is_insufficient_data() {
    let records = vec![
        expense("a", 10.0, "dining", date(2026, 1, 5)),
        expense("b", 10.0, "dining", date(2026, 2, 5)),
    ];

    let err = build_training_set(&records, 15).unwrap_err();
    assert!(err.is_insufficient_data());
}

#[test]
fn single_month_is_insufficient_data() {
    let records: Vec<TransactionRecord> = (0..20)
        .map(|i| expense(&format!("t{}", i), 10.0, "dining", date(2026, 1, (i % 28) + 1)))
        .collect();

    let err = build_training_set(&records, 15).unwrap_err();
    assert!(err.is_insufficient_data());
}

#[test]
fn income_records_are_excluded() {
    let mut records = vec![
        expense("a", 100.0, "dining", date(2026, 1, 5)),
        expense("b", 100.0, "dining", date(2026, 2, 5)),
    ];
    records.push(
        TransactionRecord::new("i", TransactionKind::Income, 5000.0, "salary", date(2026, 1, 1))
            .unwrap(),
    );

    let set = build_training_set(&records, 1).unwrap();
    assert_eq!(set.category_order, vec!["dining"]);
    assert_eq!(set.record_count, 2);
}

#[test]
fn aggregate_vector_follows_category_order() {
    let order = vec!["dining".to_string(), "groceries".to_string()];
    let records = vec![
        expense("a", 30.0, "groceries", date(2026, 3, 1)),
        expense("b", 10.0, "dining", date(2026, 3, 2)),
        expense("c", 5.0, "dining", date(2026, 3, 3)),
        // Unknown category is ignored
        expense("d", 99.0, "travel", date(2026, 3, 4)),
    ];

    assert_eq!(aggregate_vector(&records, &order), vec![15.0, 30.0]);
}
