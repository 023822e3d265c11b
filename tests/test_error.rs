use spend_forecast::error::ForecastError;

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("dropout must be in [0, 1)".to_string());
    let error_string = format!("{}", error);
    assert!(error_string.contains("dropout must be in [0, 1)"));

    let error = ForecastError::TrainingFailure("loss diverged".to_string());
    let error_string = format!("{}", error);
    assert!(error_string.contains("Training failure"));
    assert!(error_string.contains("loss diverged"));
}

#[test]
fn test_error_creation() {
    let data_error = ForecastError::DataError("empty transaction set".to_string());
    let training_error = ForecastError::TrainingFailure("failed to converge".to_string());
    let parameter_error = ForecastError::InvalidParameter("invalid cap".to_string());

    assert!(matches!(data_error, ForecastError::DataError(_)));
    assert!(matches!(training_error, ForecastError::TrainingFailure(_)));
    assert!(matches!(
        parameter_error,
        ForecastError::InvalidParameter(_)
    ));

    if let ForecastError::DataError(msg) = data_error {
        assert_eq!(msg, "empty transaction set");
    } else {
        panic!("Wrong error variant");
    }
}

#[test]
fn insufficient_data_is_flagged_as_benign() {
    let benign = ForecastError::InsufficientData("only 4 records".to_string());
    assert!(benign.is_insufficient_data());

    let failure = ForecastError::TrainingFailure("NaN loss".to_string());
    assert!(!failure.is_insufficient_data());
}
