//! API handlers module

pub mod health;
pub mod papers;
pub mod stats;
pub mod universities;
pub mod upload;

use pyqhub_common::errors::AppError;
use validator::ValidationErrors;

/// Convert `validator` failures into a 400 naming one offending field
pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let field = errors.field_errors().keys().next().map(|f| f.to_string());

    AppError::Validation {
        message: errors.to_string(),
        field,
    }
}
