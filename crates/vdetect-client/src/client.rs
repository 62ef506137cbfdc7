//! Detection backend HTTP client.
//!
//! - `POST /upload` with a streamed multipart body and transfer progress
//! - result media download
//! - single-frame detection

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;

use vdetect_models::{
    url_file_name, DetectionResult, ErrorBody, FrameDetectRequest, FrameDetections, SelectedFile,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::metrics::{record_download, record_upload};

/// Size of each body chunk handed to the transport.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "file";

const UPLOAD_PATH: &str = "/upload";
const DETECT_FRAME_PATH: &str = "/detect_frame";

/// Bytes handed to the transport so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub sent: u64,
    /// Total body size when known
    pub total: Option<u64>,
}

/// Receives transfer notifications while the body is being sent.
pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// A callback that discards notifications.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Detection backend client.
#[derive(Clone)]
pub struct DetectClient {
    http: Client,
    config: ClientConfig,
}

impl DetectClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("vdetect-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve a (possibly relative) URL against the server.
    pub fn resolve_url(&self, url: &str) -> ClientResult<Url> {
        Ok(self.config.server_url.join(url)?)
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Send one file for detection.
    ///
    /// `on_progress` fires for every chunk handed to the transport. No retry
    /// is attempted on any failure.
    pub async fn upload(
        &self,
        file: &SelectedFile,
        on_progress: ProgressCallback,
    ) -> ClientResult<DetectionResult> {
        let span = info_span!("upload", file = %file.file_name, mime = %file.mime_type, size = file.size);

        async {
            let started = Instant::now();
            let result = self.send_upload(file, on_progress).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            let outcome = match &result {
                Ok(_) => "success",
                Err(ClientError::Server { .. }) => "server_error",
                Err(ClientError::InvalidResponse(_)) => "invalid_response",
                Err(_) => "transport_error",
            };
            record_upload(outcome, file.size, latency_ms);

            match &result {
                Ok(r) => info!(kind = %r.kind(), result_url = %r.result_url, latency_ms, "Upload complete"),
                Err(e) => warn!(latency_ms, "Upload failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn send_upload(
        &self,
        file: &SelectedFile,
        on_progress: ProgressCallback,
    ) -> ClientResult<DetectionResult> {
        let url = self.resolve_url(UPLOAD_PATH)?;
        let data = file.read_bytes().await?;
        let total = data.len() as u64;

        let part = Part::stream_with_length(progress_body(data, on_progress), total)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!("POST {} ({} bytes)", url, total);
        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            let message = ErrorBody::parse(&body).error;
            return Err(ClientError::server(status.as_u16(), message));
        }

        DetectionResult::from_json(&body).map_err(|e| ClientError::invalid_response(e.to_string()))
    }

    // =========================================================================
    // Download
    // =========================================================================

    /// Fetch result media into `dest_dir`, named after the URL's final
    /// path segment. Returns the written path.
    pub async fn download(&self, result_url: &str, dest_dir: &Path) -> ClientResult<PathBuf> {
        let url = self.resolve_url(result_url)?;
        let name = match url_file_name(url.path()) {
            "" => "result",
            name => name,
        };
        let dest = dest_dir.join(name);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            record_download("server_error");
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::server(status.as_u16(), ErrorBody::parse(&body).error));
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let mut out = tokio::fs::File::create(&dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;

        record_download("success");
        info!(url = %url, path = %dest.display(), bytes = written, "Downloaded result");
        Ok(dest)
    }

    // =========================================================================
    // Single frame
    // =========================================================================

    /// Run detection on one JPEG frame.
    pub async fn detect_frame(&self, jpeg: &[u8]) -> ClientResult<FrameDetections> {
        let url = self.resolve_url(DETECT_FRAME_PATH)?;
        let request = FrameDetectRequest {
            image: format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg)),
        };

        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::server(status.as_u16(), ErrorBody::parse(&body).error));
        }

        let frame: FrameDetections = serde_json::from_str(&body)
            .map_err(|e| ClientError::invalid_response(e.to_string()))?;
        debug!(count = frame.count, "Frame detections received");
        Ok(frame)
    }
}

/// Report each chunk of `data` as the transport pulls it.
fn progress_body(data: Vec<u8>, on_progress: ProgressCallback) -> Body {
    let data = Bytes::from(data);
    let total = data.len() as u64;
    let chunks = chunk_slices(&data);

    let mut sent: u64 = 0;
    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        on_progress(TransferProgress {
            sent,
            total: Some(total),
        });
        Ok::<_, std::io::Error>(chunk)
    });
    Body::wrap_stream(stream)
}

/// `UPLOAD_CHUNK_SIZE` views into `data`, sharing its buffer.
fn chunk_slices(data: &Bytes) -> Vec<Bytes> {
    (0..data.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_share_the_upload_buffer() {
        let data = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let chunks = chunk_slices(&data);

        let sizes: Vec<_> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![UPLOAD_CHUNK_SIZE, UPLOAD_CHUNK_SIZE, 10]);

        let base = data.as_ptr() as usize;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.as_ptr() as usize, base + i * UPLOAD_CHUNK_SIZE);
        }
    }

    #[test]
    fn test_empty_file_has_no_chunks() {
        assert!(chunk_slices(&Bytes::new()).is_empty());
    }
}
