//! Field-level validation applied in the handlers before any payload
//! reaches the lifecycle services.

use bigdecimal::BigDecimal;

use crate::error::AppError;

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 120;
pub const PHONE_MAX_LEN: usize = 32;
pub const NOTES_MAX_LEN: usize = 2000;
pub const SERVICE_MAX_LEN: usize = 120;
pub const TRANSACTION_REF_MAX_LEN: usize = 255;
pub const REMARK_MAX_LEN: usize = 1000;
pub const VERIFY_NOTE_MAX_LEN: usize = 500;
pub const SERVICE_CODE_MAX_LEN: usize = 64;
pub const SERVICE_DESCRIPTION_MAX_LEN: usize = 1000;
pub const SETTING_KEY_MAX_LEN: usize = 64;
pub const SETTING_VALUE_MAX_LEN: usize = 2000;

/// Strips control characters and collapses runs of whitespace.
pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn invalid(field: &str, message: &str) -> AppError {
    AppError::Validation(format!("{}: {}", field, message))
}

pub fn validate_required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

pub fn validate_min_len(field: &str, value: &str, min_len: usize) -> Result<(), AppError> {
    if value.chars().count() < min_len {
        return Err(invalid(
            field,
            &format!("must be at least {} characters", min_len),
        ));
    }
    Ok(())
}

pub fn validate_max_len(field: &str, value: &str, max_len: usize) -> Result<(), AppError> {
    if value.chars().count() > max_len {
        return Err(invalid(
            field,
            &format!("must be at most {} characters", max_len),
        ));
    }
    Ok(())
}

pub fn validate_enum(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(invalid(
            field,
            &format!("must be one of: {}", allowed.join(", ")),
        ));
    }
    Ok(())
}

/// Minimal shape check, not full RFC 5322: one '@' with a dotted domain.
pub fn validate_email(field: &str, value: &str) -> Result<(), AppError> {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None)
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err(invalid(field, "must be a valid email address")),
    }
}

pub fn validate_positive_amount(field: &str, value: &BigDecimal) -> Result<(), AppError> {
    if *value <= BigDecimal::from(0) {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(())
}

pub fn validate_non_negative_amount(field: &str, value: &BigDecimal) -> Result<(), AppError> {
    if *value < BigDecimal::from(0) {
        return Err(invalid(field, "must not be negative"));
    }
    Ok(())
}
