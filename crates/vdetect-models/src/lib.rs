//! Shared data models for the vdetect upload client.
//!
//! This crate provides Serde-serializable types for:
//! - User-selected media files and client-side validation
//! - Upload progress phases
//! - Detection results returned by the backend
//! - Error and frame-detection wire bodies

pub mod detection;
pub mod error;
pub mod media;
pub mod progress;

// Re-export common types
pub use detection::{
    BoxDetection, DetectionResult, DetectionStats, ErrorBody, FrameDetectRequest,
    FrameDetections, ImageStats, VideoStats,
};
pub use error::{ValidationError, ValidationResult};
pub use media::{
    mime_for_extension, url_file_name, FilePayload, MediaKind, SelectedFile, ACCEPTED_MIME_TYPES,
    MAX_UPLOAD_BYTES,
};
pub use progress::{UploadPhase, UploadProgressState, UPLOAD_SHARE_PERCENT};
