//! Upload metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

pub mod names {
    /// Total upload attempts by outcome.
    pub const UPLOADS_TOTAL: &str = "vdetect_uploads_total";

    /// Upload round-trip latency in seconds by outcome.
    pub const UPLOAD_LATENCY_SECONDS: &str = "vdetect_upload_latency_seconds";

    /// Payload size of accepted uploads.
    pub const UPLOAD_BYTES: &str = "vdetect_upload_bytes";

    /// Total result downloads by outcome.
    pub const DOWNLOADS_TOTAL: &str = "vdetect_downloads_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a finished upload attempt.
pub fn record_upload(outcome: &'static str, bytes: u64, latency_ms: f64) {
    counter!(names::UPLOADS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::UPLOAD_LATENCY_SECONDS, "outcome" => outcome).record(latency_ms / 1000.0);
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record a result download.
pub fn record_download(outcome: &'static str) {
    counter!(names::DOWNLOADS_TOTAL, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::UPLOADS_TOTAL.contains("uploads"));
        assert!(names::UPLOAD_LATENCY_SECONDS.contains("latency"));
        assert!(names::DOWNLOADS_TOTAL.starts_with("vdetect_"));
    }
}
