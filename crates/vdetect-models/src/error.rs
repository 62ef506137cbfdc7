//! Validation error types.

use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reasons a selected file is rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

impl ValidationError {
    /// Message shown to the user in a blocking notice.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedType(_) => {
                "Invalid file type. Please upload an image or video file."
            }
            ValidationError::TooLarge { .. } => "File too large. Maximum size is 100MB.",
        }
    }
}
