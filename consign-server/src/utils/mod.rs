//! Utility Module
//!
//! Cross-cutting helpers: error types, logging setup, validation.

pub mod error;
pub mod logger;
pub mod result;
pub mod validation;

pub use error::{AppError, AppResponse, ok, ok_with_message};
pub use result::AppResult;
pub use validation::{
    MAX_ADDRESS_LEN, MAX_DESCRIPTION_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PHOTOS, MIN_PHOTOS,
    validate_email, validate_non_negative_amount, validate_photo_count,
    validate_positive_amount, validate_required_text,
};
