//! Terminal display surface.
//!
//! Progress is an `indicatif` bar on stderr; the result view is printed to
//! stdout as text, JSON or HTML fragments. Download requests are queued for
//! the caller, which owns the HTTP client.

use std::fmt::Write as _;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

use vdetect_models::FrameDetections;
use vdetect_ui::{render_html, DetectionDetails, DisplaySurface, MediaView, ResultView};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

#[derive(Default)]
struct TerminalState {
    bar: Option<ProgressBar>,
    position: u64,
    message: String,
    pending_download: Option<(String, String)>,
}

pub struct TerminalSurface {
    format: OutputFormat,
    draw_hidden: bool,
    state: Mutex<TerminalState>,
}

impl TerminalSurface {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            draw_hidden: false,
            state: Mutex::new(TerminalState::default()),
        }
    }

    /// Surface whose bar never draws.
    #[cfg(test)]
    fn hidden(format: OutputFormat) -> Self {
        Self {
            draw_hidden: true,
            ..Self::new(format)
        }
    }

    /// Take the most recent download request, if any.
    pub fn take_download(&self) -> Option<(String, String)> {
        self.lock().pending_download.take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TerminalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn new_bar(&self, state: &TerminalState) -> ProgressBar {
        let target = if self.draw_hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let bar = ProgressBar::with_draw_target(Some(100), target);
        bar.set_style(progress_style());
        bar.set_position(state.position);
        bar.set_message(state.message.clone());
        bar
    }

    fn render(&self, view: &ResultView) -> String {
        match self.format {
            OutputFormat::Text => render_text(view),
            OutputFormat::Json => match serde_json::to_string_pretty(view) {
                Ok(json) => format!("{}\n", json),
                Err(e) => {
                    debug!("Failed to encode result: {}", e);
                    render_text(view)
                }
            },
            OutputFormat::Html => {
                let html = render_html(view);
                format!("{}\n{}\n{}\n", html.stats_grid, html.media, html.details)
            }
        }
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{bar:30}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#.")
}

/// Plain-text rendering of a result view.
pub fn render_text(view: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Detection results ({})", view.kind);
    for card in &view.stats {
        let _ = writeln!(out, "  {:<18} {}", format!("{}:", card.label), card.value);
    }

    match &view.media {
        MediaView::Image { src, .. } => {
            let _ = writeln!(out, "Annotated image: {}", src);
        }
        MediaView::Video { src, .. } => {
            let _ = writeln!(out, "Annotated video: {}", src);
        }
    }

    match &view.details {
        DetectionDetails::Empty { notice } => {
            let _ = writeln!(out, "{}", notice);
        }
        DetectionDetails::List { heading, items } => {
            let _ = writeln!(out, "{}", heading);
            let width = items.iter().map(|i| i.name.len()).max().unwrap_or(0);
            for item in items {
                let _ = writeln!(out, "  {:<width$}  {}", item.name, item.count, width = width);
            }
        }
    }
    out
}

/// Plain-text rendering of single-frame detections.
pub fn render_frame_text(frame: &FrameDetections) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} objects detected", frame.count);
    for det in &frame.detections {
        let _ = writeln!(
            out,
            "  {:<14} {:>5.1}%  [{:.0}, {:.0}, {:.0}, {:.0}]",
            det.name,
            det.confidence * 100.0,
            det.xmin,
            det.ymin,
            det.xmax,
            det.ymax
        );
    }
    out
}

impl DisplaySurface for TerminalSurface {
    fn set_drop_zone_visible(&self, _visible: bool) {}

    fn set_drop_zone_active(&self, _active: bool) {}

    fn set_progress_visible(&self, visible: bool) {
        let mut state = self.lock();
        if visible {
            if state.bar.is_none() {
                state.bar = Some(self.new_bar(&state));
            }
        } else if let Some(bar) = state.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn set_results_visible(&self, _visible: bool) {}

    fn set_progress_percent(&self, percent: f64) {
        let mut state = self.lock();
        state.position = percent.clamp(0.0, 100.0).round() as u64;
        if let Some(bar) = &state.bar {
            bar.set_position(state.position);
        }
    }

    fn set_progress_text(&self, text: &str) {
        let mut state = self.lock();
        state.message = text.to_string();
        if let Some(bar) = &state.bar {
            bar.set_message(text.to_string());
        }
    }

    fn open_file_picker(&self) {}

    fn clear_file_picker(&self) {}

    fn apply_result(&self, view: &ResultView) {
        let out = self.render(view);
        match &self.lock().bar {
            Some(bar) => bar.suspend(|| print!("{}", out)),
            None => print!("{}", out),
        }
    }

    fn scroll_results_into_view(&self) {
        debug!("scroll requested");
    }

    fn notify(&self, message: &str) {
        match &self.lock().bar {
            Some(bar) => bar.suspend(|| eprintln!("{}", message)),
            None => eprintln!("{}", message),
        }
    }

    fn trigger_download(&self, url: &str, file_name: &str) {
        self.lock().pending_download = Some((url.to_string(), file_name.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdetect_models::{BoxDetection, MediaKind};
    use vdetect_ui::{DetectionItem, StatCard};

    fn sample_view() -> ResultView {
        ResultView {
            kind: MediaKind::Image,
            stats: vec![
                StatCard { value: "4".into(), label: "Objects Detected".into() },
                StatCard { value: "2".into(), label: "Unique Classes".into() },
            ],
            media: MediaView::Image {
                src: "/static/results/a.jpg".into(),
                alt: "Detection Result".into(),
            },
            details: DetectionDetails::List {
                heading: "Detected Objects".into(),
                items: vec![
                    DetectionItem { name: "person".into(), count: 3, index: 0 },
                    DetectionItem { name: "car".into(), count: 1, index: 1 },
                ],
            },
            download_url: "/static/results/a.jpg".into(),
        }
    }

    #[test]
    fn test_bar_follows_progress_calls() {
        let surface = TerminalSurface::hidden(OutputFormat::Text);
        surface.set_progress_percent(12.0);
        assert!(surface.lock().bar.is_none());

        surface.set_progress_visible(true);
        {
            let state = surface.lock();
            let bar = state.bar.as_ref().unwrap();
            assert_eq!(bar.length(), Some(100));
            assert_eq!(bar.position(), 12);
        }

        surface.set_progress_percent(55.0);
        surface.set_progress_text("Processing with YOLOv5...");
        {
            let state = surface.lock();
            let bar = state.bar.as_ref().unwrap();
            assert_eq!(bar.position(), 55);
            assert_eq!(bar.message(), "Processing with YOLOv5...");
        }

        surface.set_progress_percent(250.0);
        assert_eq!(surface.lock().bar.as_ref().unwrap().position(), 100);

        surface.notify("Error: Upload failed");
        surface.set_progress_visible(false);
        assert!(surface.lock().bar.is_none());
    }

    #[test]
    fn test_render_text_lists_in_order() {
        let text = render_text(&sample_view());
        assert!(text.starts_with("Detection results (image)\n"));
        assert!(text.contains("Objects Detected:  4"));
        assert!(text.contains("Annotated image: /static/results/a.jpg"));
        assert!(text.find("person").unwrap() < text.find("car").unwrap());
    }

    #[test]
    fn test_html_format_prints_fragments() {
        let surface = TerminalSurface::hidden(OutputFormat::Html);
        let out = surface.render(&sample_view());
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("<img src=\"/static/results/a.jpg\" alt=\"Detection Result\">"));
        assert!(out.contains("Detected Objects"));
    }

    #[test]
    fn test_json_format_is_valid_json() {
        let surface = TerminalSurface::hidden(OutputFormat::Json);
        let out = surface.render(&sample_view());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["download_url"], "/static/results/a.jpg");
    }

    #[test]
    fn test_render_frame_text() {
        let frame = FrameDetections {
            success: true,
            detections: vec![BoxDetection {
                xmin: 10.0,
                ymin: 20.0,
                xmax: 110.0,
                ymax: 220.0,
                confidence: 0.875,
                class_id: 0,
                name: "person".into(),
            }],
            count: 1,
            error: None,
        };
        let text = render_frame_text(&frame);
        assert!(text.starts_with("1 objects detected\n"));
        assert!(text.contains("person"));
        assert!(text.contains("87.5%"));
        assert!(text.contains("[10, 20, 110, 220]"));
    }

    #[test]
    fn test_download_request_is_queued_once() {
        let surface = TerminalSurface::hidden(OutputFormat::Text);
        surface.trigger_download("/r/abc.jpg", "abc.jpg");
        assert_eq!(
            surface.take_download(),
            Some(("/r/abc.jpg".to_string(), "abc.jpg".to_string()))
        );
        assert_eq!(surface.take_download(), None);
    }
}
