//! Upload & result controller for the detection client.
//!
//! This crate provides:
//! - `UploadController`: file intake, validation, upload, progress, reset, download
//! - `render_result`: pure view model of a detection result
//! - `DisplaySurface`: the seam to whatever displays the page
//! - HTML fragments for browser surfaces

pub mod controller;
pub mod error;
pub mod html;
pub mod surface;
pub mod uploader;
pub mod view;


pub use controller::{EventDisposition, ProgressTiming, UploadController};
pub use error::{UploadError, UploadResult};
pub use html::{escape_html, render_html, HtmlFragments};
pub use surface::{DisplaySurface, MemorySurface, SurfaceSnapshot};
pub use uploader::Uploader;
pub use view::{
    render_result, sorted_detections, DetectionDetails, DetectionItem, MediaView, ResultView,
    StatCard,
};
