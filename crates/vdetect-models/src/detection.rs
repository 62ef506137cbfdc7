//! Detection results and backend wire bodies.
//!
//! These types match the JSON produced by the detection backend:
//!
//! ```json
//! { "success": true, "type": "image", "filename": "detected_x.jpg",
//!   "result_url": "/static/results/detected_x.jpg",
//!   "data": { "total_objects": 4, "object_counts": { "person": 3, "car": 1 } } }
//! ```

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::media::MediaKind;

/// One bounding box reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxDetection {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub confidence: f64,
    /// Class index
    #[serde(rename = "class")]
    pub class_id: u32,
    /// Class name
    pub name: String,
}

/// Statistics for a processed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub total_objects: u64,
    /// Class name to occurrence count, in the order the backend listed them
    #[serde(default)]
    pub object_counts: IndexMap<String, u64>,
    /// Raw boxes. Not shown in the results view, so a malformed list
    /// degrades to empty instead of failing the whole result.
    #[serde(default, deserialize_with = "lenient")]
    pub detections: Vec<BoxDetection>,
}

/// Statistics for a processed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub processed_frames: u64,
    pub fps: f64,
    pub total_detections: u64,
    /// Container frame count. Some containers report a negative or
    /// fractional value; anything that is not an integer reads as `None`.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_frames: Option<i64>,
    /// Counts sampled across frames
    #[serde(default)]
    pub object_counts: IndexMap<String, u64>,
}

/// Deserialize `T`, falling back to `T::default()` when the value has the
/// wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Kind-specific statistics. Exactly one shape exists per result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DetectionStats {
    Image(ImageStats),
    Video(VideoStats),
}

impl DetectionStats {
    pub fn kind(&self) -> MediaKind {
        match self {
            DetectionStats::Image(_) => MediaKind::Image,
            DetectionStats::Video(_) => MediaKind::Video,
        }
    }

    pub fn object_counts(&self) -> &IndexMap<String, u64> {
        match self {
            DetectionStats::Image(s) => &s.object_counts,
            DetectionStats::Video(s) => &s.object_counts,
        }
    }
}

/// Raw success body as sent by the backend.
#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    #[serde(rename = "type")]
    kind: MediaKind,
    result_url: String,
    #[serde(default)]
    filename: Option<String>,
    data: serde_json::Value,
}

/// Parsed result of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UploadResponseBody")]
pub struct DetectionResult {
    /// URL of the annotated media, usually relative to the server
    pub result_url: String,
    /// Output file name assigned by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(flatten)]
    pub stats: DetectionStats,
}

impl TryFrom<UploadResponseBody> for DetectionResult {
    type Error = serde_json::Error;

    fn try_from(body: UploadResponseBody) -> Result<Self, Self::Error> {
        let stats = match body.kind {
            MediaKind::Image => DetectionStats::Image(serde_json::from_value(body.data)?),
            MediaKind::Video => DetectionStats::Video(serde_json::from_value(body.data)?),
        };
        Ok(Self {
            result_url: body.result_url,
            filename: body.filename,
            stats,
        })
    }
}

impl DetectionResult {
    /// Parse a success body.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    pub fn kind(&self) -> MediaKind {
        self.stats.kind()
    }

    pub fn object_counts(&self) -> &IndexMap<String, u64> {
        self.stats.object_counts()
    }
}

/// Failure body: `{ "error": "..." }`, field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parse leniently: anything that is not a JSON object yields an empty body.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

/// Request body for single-frame detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDetectRequest {
    /// Base64 image, optionally as a `data:` URL
    pub image: String,
}

/// Response body for single-frame detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub detections: Vec<BoxDetection>,
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_image_result() {
        let body = json!({
            "success": true,
            "type": "image",
            "filename": "detected_1.jpg",
            "result_url": "/static/results/detected_1.jpg",
            "data": {
                "total_objects": 4,
                "object_counts": { "person": 3, "car": 1 },
                "detections": [{
                    "xmin": 1.0, "ymin": 2.0, "xmax": 3.0, "ymax": 4.0,
                    "confidence": 0.9, "class": 0, "name": "person"
                }]
            }
        })
        .to_string();

        let result = DetectionResult::from_json(&body).unwrap();
        assert_eq!(result.kind(), MediaKind::Image);
        assert_eq!(result.filename.as_deref(), Some("detected_1.jpg"));
        match &result.stats {
            DetectionStats::Image(stats) => {
                assert_eq!(stats.total_objects, 4);
                assert_eq!(stats.detections.len(), 1);
                assert_eq!(stats.detections[0].class_id, 0);
            }
            other => panic!("expected image stats, got {:?}", other),
        }
    }

    #[test]
    fn test_object_counts_keep_backend_order() {
        let body = r#"{"type":"image","result_url":"/r.jpg",
            "data":{"total_objects":3,"object_counts":{"zebra":1,"apple":1,"mango":1}}}"#;
        let result = DetectionResult::from_json(body).unwrap();
        let keys: Vec<_> = result.object_counts().keys().cloned().collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_parse_video_result() {
        let body = json!({
            "type": "video",
            "result_url": "/static/results/detected_clip.mp4",
            "data": {
                "total_frames": 121,
                "processed_frames": 120,
                "fps": 24,
                "total_detections": 57,
                "object_counts": { "dog": 40, "cat": 17 }
            }
        })
        .to_string();

        let result = DetectionResult::from_json(&body).unwrap();
        match &result.stats {
            DetectionStats::Video(stats) => {
                assert_eq!(stats.processed_frames, 120);
                assert_eq!(stats.fps, 24.0);
                assert_eq!(stats.total_detections, 57);
                assert_eq!(stats.total_frames, Some(121));
            }
            other => panic!("expected video stats, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_frame_count_still_parses() {
        let body = r#"{"type":"video","result_url":"/r.mp4",
            "data":{"total_frames":-1,"processed_frames":120,"fps":24,
                    "total_detections":57,"object_counts":{"dog":40}}}"#;
        let result = DetectionResult::from_json(body).unwrap();
        match &result.stats {
            DetectionStats::Video(stats) => {
                assert_eq!(stats.total_frames, Some(-1));
                assert_eq!(stats.processed_frames, 120);
                assert_eq!(stats.total_detections, 57);
            }
            other => panic!("expected video stats, got {:?}", other),
        }

        let body = r#"{"type":"video","result_url":"/r.mp4",
            "data":{"total_frames":"n/a","processed_frames":1,"fps":1,"total_detections":0}}"#;
        let result = DetectionResult::from_json(body).unwrap();
        match &result.stats {
            DetectionStats::Video(stats) => assert_eq!(stats.total_frames, None),
            other => panic!("expected video stats, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_boxes_do_not_reject_result() {
        let body = json!({
            "type": "image",
            "result_url": "/static/results/detected_2.jpg",
            "data": {
                "total_objects": 1,
                "object_counts": { "person": 1 },
                "detections": [{
                    "xmin": 1.0, "ymin": 2.0, "xmax": 3.0, "ymax": 4.0,
                    "confidence": 0.9, "class": 0.0, "name": "person"
                }]
            }
        })
        .to_string();

        let result = DetectionResult::from_json(&body).unwrap();
        match &result.stats {
            DetectionStats::Image(stats) => {
                assert_eq!(stats.total_objects, 1);
                assert!(stats.detections.is_empty());
            }
            other => panic!("expected image stats, got {:?}", other),
        }
        assert_eq!(result.object_counts().get("person"), Some(&1));
    }

    #[test]
    fn test_stats_shape_must_match_kind() {
        let body = r#"{"type":"video","result_url":"/r.mp4",
            "data":{"total_objects":4,"object_counts":{}}}"#;
        assert!(DetectionResult::from_json(body).is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let body = r#"{"type":"audio","result_url":"/r.mp3","data":{}}"#;
        assert!(DetectionResult::from_json(body).is_err());
    }

    #[test]
    fn test_error_body_lenient() {
        assert_eq!(
            ErrorBody::parse(r#"{"error":"No file uploaded"}"#).error.as_deref(),
            Some("No file uploaded")
        );
        assert_eq!(ErrorBody::parse("{}").error, None);
        assert_eq!(ErrorBody::parse("<html>502</html>").error, None);
    }
}
