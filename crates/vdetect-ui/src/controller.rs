//! Upload & result controller.
//!
//! Owns the per-session state (progress, current result URL, pending
//! simulated-progress task) and drives a `DisplaySurface` through one
//! upload cycle:
//!
//! idle -> uploading -> processing -> complete -> (results shown)
//!
//! Any error returns the view to idle. The simulated-progress task is
//! aborted whenever a new upload starts or the view is reset, and every
//! surface write from that task is checked against the upload generation
//! so a late tick can never touch a reset view.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use vdetect_client::{ProgressCallback, TransferProgress};
use vdetect_models::{
    url_file_name, DetectionResult, SelectedFile, UploadPhase, UploadProgressState,
    UPLOAD_SHARE_PERCENT,
};

use crate::error::{UploadError, UploadResult};
use crate::surface::DisplaySurface;
use crate::uploader::Uploader;
use crate::view::render_result;

// =============================================================================
// Configuration
// =============================================================================

/// Timing of the simulated second half of the progress bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressTiming {
    /// Interval between steps
    pub tick: Duration,
    /// Percentage points added per step
    pub step: f64,
    /// Pause between "Complete!" and showing results
    pub settle: Duration,
}

impl Default for ProgressTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            step: 5.0,
            settle: Duration::from_millis(500),
        }
    }
}

impl ProgressTiming {
    /// Replace values the ticker cannot run with. `interval_at` panics on a
    /// zero period, and a zero or NaN step never reaches 100.
    pub fn sanitized(self) -> Self {
        let default = Self::default();
        if self.tick.is_zero() {
            warn!("Zero progress tick, using {:?}", default.tick);
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            warn!(step = self.step, "Invalid progress step, using {}", default.step);
        }
        Self {
            tick: if self.tick.is_zero() { default.tick } else { self.tick },
            step: if self.step.is_finite() && self.step > 0.0 {
                self.step
            } else {
                default.step
            },
            settle: self.settle,
        }
    }
}

/// What the host should do with the native event after a drag handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDisposition {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl EventDisposition {
    /// Drag-over, drag-leave and drop are always fully suppressed.
    pub const SUPPRESS: Self = Self {
        prevent_default: true,
        stop_propagation: true,
    };
}

// =============================================================================
// State
// =============================================================================

#[derive(Default)]
struct ControllerState {
    progress: UploadProgressState,
    current_result_url: Option<String>,
    /// Bumped on every upload start and reset
    generation: u64,
    pending: Option<AbortHandle>,
    join: Option<JoinHandle<()>>,
}

impl ControllerState {
    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            debug!(generation = self.generation, "Cancelled simulated progress");
        }
        self.join = None;
    }
}

struct Inner<S, U> {
    surface: S,
    uploader: U,
    timing: ProgressTiming,
    state: Mutex<ControllerState>,
}

impl<S: DisplaySurface, U> Inner<S, U> {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn show_idle(&self) {
        self.surface.set_drop_zone_visible(true);
        self.surface.set_progress_visible(false);
        self.surface.set_results_visible(false);
        self.surface.clear_file_picker();
    }

    fn record_transfer(&self, generation: u64, progress: TransferProgress) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        if let Some(percent) = state.progress.record_transfer(progress.sent, progress.total) {
            self.surface.set_progress_percent(percent);
        }
    }

    /// One simulated step. `None` when the upload was superseded,
    /// `Some(true)` once the bar is full.
    fn advance(&self, generation: u64) -> Option<bool> {
        let mut state = self.lock();
        if state.generation != generation {
            return None;
        }

        let percent = state.progress.advance(self.timing.step);
        self.surface.set_progress_percent(percent);
        if state.progress.is_complete() {
            self.surface.set_progress_text(UploadPhase::Complete.label());
            return Some(true);
        }
        Some(false)
    }

    fn show_result(&self, generation: u64, result: &DetectionResult) {
        let view = render_result(result);

        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        state.pending = None;
        state.current_result_url = Some(result.result_url.clone());

        self.surface.set_progress_visible(false);
        self.surface.set_results_visible(true);
        self.surface.apply_result(&view);
        self.surface.scroll_results_into_view();

        info!(
            generation,
            kind = %result.kind(),
            classes = result.object_counts().len(),
            "Results displayed"
        );
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Upload & result controller. Cheap to clone; clones share state.
pub struct UploadController<S, U> {
    inner: Arc<Inner<S, U>>,
}

impl<S, U> Clone for UploadController<S, U> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DisplaySurface, U: Uploader> UploadController<S, U> {
    pub fn new(surface: S, uploader: U) -> Self {
        Self::with_timing(surface, uploader, ProgressTiming::default())
    }

    /// Use custom progress timing. A zero tick, or a step that is not a
    /// positive finite number, falls back to the default value.
    pub fn with_timing(surface: S, uploader: U, timing: ProgressTiming) -> Self {
        let timing = timing.sanitized();
        Self {
            inner: Arc::new(Inner {
                surface,
                uploader,
                timing,
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }

    pub fn surface(&self) -> &S {
        &self.inner.surface
    }

    pub fn progress(&self) -> UploadProgressState {
        self.inner.lock().progress
    }

    /// URL of the result currently on display.
    pub fn current_result_url(&self) -> Option<String> {
        self.inner.lock().current_result_url.clone()
    }

    /// Put the page into its initial layout.
    pub fn initialize(&self) {
        let _state = self.inner.lock();
        self.inner.surface.set_drop_zone_active(false);
        self.inner.show_idle();
        debug!("Controller initialized");
    }

    // =========================================================================
    // Event handlers
    // =========================================================================

    pub fn on_drop_zone_click(&self) {
        self.inner.surface.open_file_picker();
    }

    pub fn on_drag_over(&self) -> EventDisposition {
        self.inner.surface.set_drop_zone_active(true);
        EventDisposition::SUPPRESS
    }

    pub fn on_drag_leave(&self) -> EventDisposition {
        self.inner.surface.set_drop_zone_active(false);
        EventDisposition::SUPPRESS
    }

    /// Files dropped on the drop zone. Only the first is uploaded; the host
    /// suppresses the native event with [`EventDisposition::SUPPRESS`].
    /// Returns `None` when nothing was dropped.
    pub async fn on_drop(&self, files: Vec<SelectedFile>) -> Option<UploadResult<()>> {
        self.inner.surface.set_drop_zone_active(false);
        self.upload_first(files).await
    }

    /// Files chosen through the picker.
    pub async fn on_files_selected(&self, files: Vec<SelectedFile>) -> Option<UploadResult<()>> {
        self.upload_first(files).await
    }

    async fn upload_first(&self, files: Vec<SelectedFile>) -> Option<UploadResult<()>> {
        if files.len() > 1 {
            debug!(ignored = files.len() - 1, "Ignoring extra files");
        }
        let file = files.into_iter().next()?;
        Some(self.validate_and_upload(file).await)
    }

    // =========================================================================
    // Upload cycle
    // =========================================================================

    /// Validate `file`, send it, and schedule the result display.
    ///
    /// `Ok(())` means the response arrived and the simulated progress is
    /// running; use [`wait_for_result`](Self::wait_for_result) to await the
    /// rendered result.
    pub async fn validate_and_upload(&self, file: SelectedFile) -> UploadResult<()> {
        if let Err(e) = file.validate() {
            warn!(file = %file.file_name, mime = %file.mime_type, size = file.size, "Rejected file: {}", e);
            let err = UploadError::from(e);
            self.fail(&err);
            return Err(err);
        }

        let generation = self.begin_upload(&file);

        let inner = Arc::clone(&self.inner);
        let on_progress: ProgressCallback =
            Arc::new(move |progress| inner.record_transfer(generation, progress));

        match self.inner.uploader.upload(&file, on_progress).await {
            Ok(result) => self.begin_processing(generation, result),
            Err(e) => {
                if !self.is_current(generation) {
                    debug!(generation, "Ignoring failure of superseded upload: {}", e);
                    return Err(UploadError::Superseded);
                }
                let err = UploadError::from(e);
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.lock().generation == generation
    }

    fn begin_upload(&self, file: &SelectedFile) -> u64 {
        let mut state = self.inner.lock();
        state.cancel_pending();
        state.generation += 1;
        state.current_result_url = None;
        state.progress.begin_upload();

        let surface = &self.inner.surface;
        surface.set_drop_zone_visible(false);
        surface.set_progress_visible(true);
        surface.set_results_visible(false);
        surface.set_progress_percent(0.0);
        surface.set_progress_text(UploadPhase::Uploading.label());

        info!(
            generation = state.generation,
            file = %file.file_name,
            mime = %file.mime_type,
            size = file.size,
            "Upload started"
        );
        state.generation
    }

    fn begin_processing(&self, generation: u64, result: DetectionResult) -> UploadResult<()> {
        let mut state = self.inner.lock();
        if state.generation != generation {
            debug!(generation, "Dropping result of superseded upload");
            return Err(UploadError::Superseded);
        }

        state.progress.begin_processing();
        self.inner.surface.set_progress_percent(UPLOAD_SHARE_PERCENT);
        self.inner.surface.set_progress_text(UploadPhase::Processing.label());

        let inner = Arc::clone(&self.inner);
        let timing = self.inner.timing;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + timing.tick, timing.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match inner.advance(generation) {
                    None => return,
                    Some(true) => break,
                    Some(false) => {}
                }
            }
            sleep(timing.settle).await;
            inner.show_result(generation, &result);
        });

        state.pending = Some(handle.abort_handle());
        state.join = Some(handle);
        Ok(())
    }

    /// Wait until the pending result is displayed. Returns `false` if there
    /// is nothing pending or the display was cancelled.
    pub async fn wait_for_result(&self) -> bool {
        let handle = self.inner.lock().join.take();
        match handle {
            Some(handle) => handle.await.is_ok() && self.current_result_url().is_some(),
            None => false,
        }
    }

    fn fail(&self, err: &UploadError) {
        if let Some(message) = err.user_message() {
            self.inner.surface.notify(&message);
        }
        self.reset_view();
    }

    // =========================================================================
    // Reset / download
    // =========================================================================

    /// Back to the drop zone. Cancels any pending result display.
    pub fn reset_view(&self) {
        let mut state = self.inner.lock();
        state.cancel_pending();
        state.generation += 1;
        state.progress.reset();
        state.current_result_url = None;
        self.inner.show_idle();
        debug!(generation = state.generation, "View reset");
    }

    /// Start a download of the current result. Returns `false` (and does
    /// nothing) when no result is stored.
    pub fn download_current_result(&self) -> bool {
        let state = self.inner.lock();
        match state.current_result_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => {
                let file_name = url_file_name(url);
                info!(url, file_name, "Downloading result");
                self.inner.surface.trigger_download(url, file_name);
                true
            }
            None => false,
        }
    }
}
