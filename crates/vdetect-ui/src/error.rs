//! Upload attempt errors.

use thiserror::Error;

use vdetect_client::ClientError;
use vdetect_models::ValidationError;

pub type UploadResult<T> = Result<T, UploadError>;

/// Why an upload attempt ended without a result. Every variant is terminal
/// for the attempt; nothing is retried.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// The view was reset or another upload started while this one was in flight.
    #[error("Upload superseded")]
    Superseded,
}

impl UploadError {
    /// Text for the blocking notice, if one should be shown.
    pub fn user_message(&self) -> Option<String> {
        match self {
            UploadError::Validation(e) => Some(e.user_message().to_string()),
            UploadError::Client(e) => Some(e.user_message()),
            UploadError::Superseded => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = UploadError::from(ValidationError::UnsupportedType("text/plain".into()));
        assert_eq!(
            err.user_message().as_deref(),
            Some("Invalid file type. Please upload an image or video file.")
        );

        let err = UploadError::from(ClientError::server(400, None));
        assert_eq!(err.user_message().as_deref(), Some("Error: Upload failed"));

        assert_eq!(UploadError::Superseded.user_message(), None);
    }
}
