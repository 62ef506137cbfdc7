//! HTTP client for the object-detection upload backend.
//!
//! This crate provides:
//! - Multipart upload with transfer progress callbacks
//! - Server/transport/invalid-response error classification
//! - Result media download and single-frame detection
//! - Upload metrics via the `metrics` facade

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;


pub use client::{
    no_progress, DetectClient, ProgressCallback, TransferProgress, UPLOAD_CHUNK_SIZE, UPLOAD_FIELD,
};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, GENERIC_FAILURE, INVALID_RESPONSE, TRANSPORT_FAILURE};
