use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::NotFound("test".into()), "NOT_FOUND")]
#[case(AppError::Validation("test".into()), "VALIDATION_ERROR")]
#[case(AppError::InvalidOperation("test".into()), "INVALID_OPERATION")]
#[case(AppError::Structural("test".into()), "STRUCTURAL_FAILURE")]
#[case(AppError::Conflict("test".into()), "CONFLICT")]
#[case(AppError::Configuration("test".into()), "CONFIGURATION_ERROR")]
#[case(AppError::Database("test".into()), "DATABASE_ERROR")]
#[case(AppError::Internal("test".into()), "INTERNAL_ERROR")]
fn test_app_error_error_codes(#[case] err: AppError, #[case] code: &str) {
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_app_error_exit_codes() {
    assert_eq!(AppError::NotFound("t".into()).exit_code(), 3);
    assert_eq!(AppError::InvalidOperation("t".into()).exit_code(), 4);
    assert_eq!(AppError::Structural("t".into()).exit_code(), 5);
    assert_eq!(AppError::Database("t".into()).exit_code(), 1);
}

#[test]
fn test_app_error_retryable() {
    assert!(AppError::Database("t".into()).is_retryable());
    assert!(AppError::Conflict("t".into()).is_retryable());
    assert!(!AppError::NotFound("t".into()).is_retryable());
    assert!(!AppError::InvalidOperation("t".into()).is_retryable());
}

#[test]
fn test_app_error_display() {
    assert_eq!(
        AppError::NotFound("transaction 7".into()).to_string(),
        "Not found: transaction 7"
    );
    assert_eq!(
        AppError::InvalidOperation("msg".into()).to_string(),
        "Invalid operation: msg"
    );
    assert_eq!(
        AppError::Structural("msg".into()).to_string(),
        "Structural failure: msg"
    );
}
