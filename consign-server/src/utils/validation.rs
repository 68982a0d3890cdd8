//! Input validation helpers
//!
//! Centralized text length constants and validation functions shared
//! by the intake and listing services.

use validator::ValidateEmail;

use crate::utils::AppError;

// ========== Text length limits ==========

/// Entity names: product names, categories
pub const MAX_NAME_LEN: usize = 200;

/// Product descriptions
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Photo count bounds per submission
pub const MIN_PHOTOS: usize = 1;
pub const MAX_PHOTOS: usize = 5;

// ========== Validation helpers ==========

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate an email address (syntax only, no deliverability check).
pub fn validate_email(value: &str, field: &str) -> Result<(), AppError> {
    if value.len() > MAX_EMAIL_LEN || !value.validate_email() {
        return Err(AppError::Validation(format!(
            "{field} is not a valid email address"
        )));
    }
    Ok(())
}

/// Validate that an amount is strictly positive.
pub fn validate_positive_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

/// Validate that an amount is zero or positive.
pub fn validate_non_negative_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Validate the photo count bounds for a submission.
pub fn validate_photo_count(count: usize) -> Result<(), AppError> {
    if count < MIN_PHOTOS {
        return Err(AppError::Validation(
            "Please add at least one photo".to_string(),
        ));
    }
    if count > MAX_PHOTOS {
        return Err(AppError::Validation(
            format!("You can only upload {MAX_PHOTOS} photos"),
        ));
    }
    Ok(())
}
