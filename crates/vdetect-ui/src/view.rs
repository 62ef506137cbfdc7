//! Pure result rendering.
//!
//! `render_result` turns a parsed detection result into a view model with
//! no side effects; applying it to a display is the surface's job.

use indexmap::IndexMap;
use serde::Serialize;

use vdetect_models::{DetectionResult, DetectionStats, MediaKind};

pub const NO_OBJECTS_NOTICE: &str = "No objects detected";
pub const DETECTED_OBJECTS_HEADING: &str = "Detected Objects";
pub const RESULT_IMAGE_ALT: &str = "Detection Result";
pub const RESULT_VIDEO_MIME: &str = "video/mp4";

/// One statistics card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub value: String,
    pub label: String,
}

impl StatCard {
    fn new(value: impl ToString, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Annotated media to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaView {
    Image { src: String, alt: String },
    /// Playable video with controls
    Video { src: String, mime: String },
}

impl MediaView {
    pub fn src(&self) -> &str {
        match self {
            MediaView::Image { src, .. } | MediaView::Video { src, .. } => src,
        }
    }
}

/// One row of the detected-object list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionItem {
    pub name: String,
    pub count: u64,
    /// Position after sorting, used for staggered animation
    pub index: usize,
}

/// Detection details region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionDetails {
    Empty { notice: String },
    List { heading: String, items: Vec<DetectionItem> },
}

impl DetectionDetails {
    pub fn items(&self) -> &[DetectionItem] {
        match self {
            DetectionDetails::Empty { .. } => &[],
            DetectionDetails::List { items, .. } => items,
        }
    }
}

/// Everything the results section shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub kind: MediaKind,
    pub stats: Vec<StatCard>,
    pub media: MediaView,
    pub details: DetectionDetails,
    /// URL kept for the download action
    pub download_url: String,
}

/// Build the view model for a detection result.
pub fn render_result(result: &DetectionResult) -> ResultView {
    let stats = match &result.stats {
        DetectionStats::Image(s) => vec![
            StatCard::new(s.total_objects, "Objects Detected"),
            StatCard::new(s.object_counts.len(), "Unique Classes"),
        ],
        DetectionStats::Video(s) => vec![
            StatCard::new(s.processed_frames, "Frames Processed"),
            StatCard::new(s.fps, "FPS"),
            StatCard::new(s.total_detections, "Total Detections"),
        ],
    };

    let media = match result.kind() {
        MediaKind::Image => MediaView::Image {
            src: result.result_url.clone(),
            alt: RESULT_IMAGE_ALT.to_string(),
        },
        MediaKind::Video => MediaView::Video {
            src: result.result_url.clone(),
            mime: RESULT_VIDEO_MIME.to_string(),
        },
    };

    let items = sorted_detections(result.object_counts());
    let details = if items.is_empty() {
        DetectionDetails::Empty {
            notice: NO_OBJECTS_NOTICE.to_string(),
        }
    } else {
        DetectionDetails::List {
            heading: DETECTED_OBJECTS_HEADING.to_string(),
            items,
        }
    };

    ResultView {
        kind: result.kind(),
        stats,
        media,
        details,
        download_url: result.result_url.clone(),
    }
}

/// Class counts sorted by count descending. Equal counts keep their
/// original order.
pub fn sorted_detections(counts: &IndexMap<String, u64>) -> Vec<DetectionItem> {
    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (name, count))| DetectionItem {
            name: name.clone(),
            count: *count,
            index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdetect_models::{ImageStats, VideoStats};

    fn image_result(counts: &[(&str, u64)], total: u64) -> DetectionResult {
        DetectionResult {
            result_url: "/static/results/outputs/abc.jpg".to_string(),
            filename: None,
            stats: DetectionStats::Image(ImageStats {
                total_objects: total,
                object_counts: counts.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                detections: vec![],
            }),
        }
    }

    #[test]
    fn test_image_stats_and_ordering() {
        let view = render_result(&image_result(&[("car", 1), ("person", 3)], 4));

        assert_eq!(view.kind, MediaKind::Image);
        assert_eq!(view.stats[0], StatCard::new(4, "Objects Detected"));
        assert_eq!(view.stats[1], StatCard::new(2, "Unique Classes"));

        let names: Vec<_> = view.details.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["person", "car"]);
        assert_eq!(view.details.items()[0].index, 0);
        assert_eq!(view.details.items()[1].index, 1);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let view = render_result(&image_result(
            &[("zebra", 2), ("apple", 5), ("mango", 2), ("kiwi", 2)],
            11,
        ));
        let names: Vec<_> = view.details.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "zebra", "mango", "kiwi"]);
    }

    #[test]
    fn test_empty_counts_render_notice_only() {
        let view = render_result(&image_result(&[], 0));
        assert_eq!(
            view.details,
            DetectionDetails::Empty {
                notice: "No objects detected".to_string()
            }
        );
        assert!(view.details.items().is_empty());
    }

    #[test]
    fn test_image_media() {
        let view = render_result(&image_result(&[("dog", 1)], 1));
        assert_eq!(
            view.media,
            MediaView::Image {
                src: "/static/results/outputs/abc.jpg".to_string(),
                alt: "Detection Result".to_string(),
            }
        );
        assert_eq!(view.download_url, "/static/results/outputs/abc.jpg");
    }

    #[test]
    fn test_video_stats_and_media() {
        let result = DetectionResult {
            result_url: "/static/results/detected_clip.mp4".to_string(),
            filename: Some("detected_clip.mp4".to_string()),
            stats: DetectionStats::Video(VideoStats {
                processed_frames: 120,
                fps: 24.0,
                total_detections: 57,
                total_frames: Some(120),
                object_counts: IndexMap::new(),
            }),
        };
        let view = render_result(&result);

        let values: Vec<_> = view.stats.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["120", "24", "57"]);
        let labels: Vec<_> = view.stats.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Frames Processed", "FPS", "Total Detections"]);
        assert_eq!(
            view.media,
            MediaView::Video {
                src: "/static/results/detected_clip.mp4".to_string(),
                mime: "video/mp4".to_string(),
            }
        );
    }

    #[test]
    fn test_fractional_fps_kept() {
        let result = DetectionResult {
            result_url: "/v.mp4".to_string(),
            filename: None,
            stats: DetectionStats::Video(VideoStats {
                processed_frames: 1,
                fps: 29.97,
                total_detections: 0,
                total_frames: None,
                object_counts: IndexMap::new(),
            }),
        };
        assert_eq!(render_result(&result).stats[1].value, "29.97");
    }
}
