//! Selected media files and client-side validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ValidationError, ValidationResult};

/// MIME types accepted before anything is sent to the backend.
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "video/mp4",
    "video/avi",
    "video/quicktime",
    "video/x-matroska",
];

/// Maximum upload size in bytes (100 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Kind of media the backend processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Classify a MIME type by its top-level type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.split('/').next() {
            Some("image") => Some(MediaKind::Image),
            Some("video") => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a file extension to the MIME type a browser would declare for it.
///
/// Only the extensions the detection backend accepts are known; anything
/// else maps to `None`.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "mp4" => Some("video/mp4"),
        "avi" => Some("video/avi"),
        "mov" => Some("video/quicktime"),
        "mkv" => Some("video/x-matroska"),
        _ => None,
    }
}

/// Final path segment of a URL, used as the suggested download file name.
pub fn url_file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Where the bytes of a selected file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePayload {
    /// Already in memory (drag-and-drop, tests).
    Memory(Vec<u8>),
    /// On disk, read when the request body is built.
    Path(PathBuf),
}

/// A user-chosen file awaiting validation and upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name sent in the multipart part
    pub file_name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    payload: FilePayload,
}

impl SelectedFile {
    /// Create from in-memory bytes.
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            payload: FilePayload::Memory(data),
        }
    }

    /// Create from explicit parts. The declared size is trusted as-is.
    pub fn from_parts(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        payload: FilePayload,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size,
            payload,
        }
    }

    /// Describe a file on disk. The MIME type is inferred from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .unwrap_or(FALLBACK_MIME);

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            size: metadata.len(),
            payload: FilePayload::Path(path.to_path_buf()),
        })
    }

    pub fn payload(&self) -> &FilePayload {
        &self.payload
    }

    /// Media kind implied by the declared MIME type.
    pub fn media_kind(&self) -> Option<MediaKind> {
        MediaKind::from_mime(&self.mime_type)
    }

    /// Load the file contents.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.payload {
            FilePayload::Memory(data) => Ok(data.clone()),
            FilePayload::Path(path) => tokio::fs::read(path).await,
        }
    }

    /// Check the declared type and size against the upload rules.
    pub fn validate(&self) -> ValidationResult<()> {
        if !ACCEPTED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(ValidationError::UnsupportedType(self.mime_type.clone()));
        }
        if self.size > MAX_UPLOAD_BYTES {
            return Err(ValidationError::TooLarge {
                size: self.size,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }
}
