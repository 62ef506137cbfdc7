//! Upload transport seam.

use async_trait::async_trait;

use vdetect_client::{ClientResult, DetectClient, ProgressCallback};
use vdetect_models::{DetectionResult, SelectedFile};

/// Sends one file and returns the parsed result.
#[async_trait]
pub trait Uploader: Send + Sync + 'static {
    async fn upload(
        &self,
        file: &SelectedFile,
        on_progress: ProgressCallback,
    ) -> ClientResult<DetectionResult>;
}

#[async_trait]
impl Uploader for DetectClient {
    async fn upload(
        &self,
        file: &SelectedFile,
        on_progress: ProgressCallback,
    ) -> ClientResult<DetectionResult> {
        DetectClient::upload(self, file, on_progress).await
    }
}
