//! Display surface abstraction.
//!
//! The controller never touches a concrete display. A surface exposes the
//! handful of operations the page regions support: toggle visibility, set
//! progress, apply a rendered result, notify, and start a download.
//!
//! Surface methods are called with the controller's state lock held and
//! must not call back into the controller.

use std::sync::Mutex;

use crate::view::ResultView;

pub trait DisplaySurface: Send + Sync + 'static {
    fn set_drop_zone_visible(&self, visible: bool);

    /// Toggle the drag "active" affordance.
    fn set_drop_zone_active(&self, active: bool);

    fn set_progress_visible(&self, visible: bool);

    fn set_results_visible(&self, visible: bool);

    /// Set the bar fill (0-100).
    fn set_progress_percent(&self, percent: f64);

    fn set_progress_text(&self, text: &str);

    fn open_file_picker(&self);

    /// Drop whatever the picker holds so the same file can be chosen again.
    fn clear_file_picker(&self);

    fn apply_result(&self, view: &ResultView);

    /// Bring the results into view with smooth scrolling.
    fn scroll_results_into_view(&self);

    /// Blocking user notification.
    fn notify(&self, message: &str);

    fn trigger_download(&self, url: &str, file_name: &str);
}

/// Everything a `MemorySurface` has been told so far.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub drop_zone_visible: bool,
    pub drop_zone_active: bool,
    pub progress_visible: bool,
    pub results_visible: bool,
    pub progress_percent: f64,
    pub progress_text: String,
    /// Every percentage written, in order
    pub progress_history: Vec<f64>,
    pub picker_opened: usize,
    pub picker_cleared: usize,
    pub result: Option<ResultView>,
    /// Number of times a result was applied
    pub results_applied: usize,
    pub scrolls: usize,
    pub notices: Vec<String>,
    pub downloads: Vec<(String, String)>,
}

impl Default for SurfaceSnapshot {
    fn default() -> Self {
        Self {
            drop_zone_visible: true,
            drop_zone_active: false,
            progress_visible: false,
            results_visible: false,
            progress_percent: 0.0,
            progress_text: String::new(),
            progress_history: Vec::new(),
            picker_opened: 0,
            picker_cleared: 0,
            result: None,
            results_applied: 0,
            scrolls: 0,
            notices: Vec::new(),
            downloads: Vec::new(),
        }
    }
}

/// In-memory surface that records every call. Starts in the idle layout.
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceSnapshot>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SurfaceSnapshot> {
        // A poisoned recorder is still readable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DisplaySurface for MemorySurface {
    fn set_drop_zone_visible(&self, visible: bool) {
        self.lock().drop_zone_visible = visible;
    }

    fn set_drop_zone_active(&self, active: bool) {
        self.lock().drop_zone_active = active;
    }

    fn set_progress_visible(&self, visible: bool) {
        self.lock().progress_visible = visible;
    }

    fn set_results_visible(&self, visible: bool) {
        self.lock().results_visible = visible;
    }

    fn set_progress_percent(&self, percent: f64) {
        let mut state = self.lock();
        state.progress_percent = percent;
        state.progress_history.push(percent);
    }

    fn set_progress_text(&self, text: &str) {
        self.lock().progress_text = text.to_string();
    }

    fn open_file_picker(&self) {
        self.lock().picker_opened += 1;
    }

    fn clear_file_picker(&self) {
        self.lock().picker_cleared += 1;
    }

    fn apply_result(&self, view: &ResultView) {
        let mut state = self.lock();
        state.result = Some(view.clone());
        state.results_applied += 1;
    }

    fn scroll_results_into_view(&self) {
        self.lock().scrolls += 1;
    }

    fn notify(&self, message: &str) {
        self.lock().notices.push(message.to_string());
    }

    fn trigger_download(&self, url: &str, file_name: &str) {
        self.lock()
            .downloads
            .push((url.to_string(), file_name.to_string()));
    }
}
