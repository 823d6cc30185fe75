//! Vision API request/response types.

use overlay_geom::{Point, Region};
use serde::{Deserialize, Serialize};

/// Caption verbosity accepted by `/caption`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CaptionLength {
    Short,
    #[default]
    Normal,
    Long,
}

/// Body of `/caption`.
#[derive(Debug, Clone, Serialize)]
pub struct CaptionRequest<'a> {
    pub image_url: &'a str,
    pub length: CaptionLength,
}

/// Body of `/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub image_url: &'a str,
    pub question: &'a str,
}

/// Body of `/detect`, `/point` and `/segment`.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectRequest<'a> {
    pub image_url: &'a str,
    pub object: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

/// Detected bounding boxes, in response order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub objects: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointResponse {
    #[serde(default)]
    pub points: Vec<Point>,
}

/// Segmentation outline. The response does not say whether `path` is
/// normalized to the whole image or to `bbox`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResponse {
    pub path: String,
    pub bbox: Region,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_request_shape() {
        let body = serde_json::to_value(CaptionRequest {
            image_url: "data:image/png;base64,AAAA",
            length: CaptionLength::Long,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"image_url": "data:image/png;base64,AAAA", "length": "long"})
        );
    }

    #[test]
    fn test_detect_response_tolerates_extra_fields() {
        let parsed: DetectResponse = serde_json::from_str(
            r#"{"request_id":"r1","objects":[{"x_min":0.1,"y_min":0.2,"x_max":0.5,"y_max":0.6}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.objects, vec![Region::new(0.1, 0.2, 0.5, 0.6)]);

        let empty: DetectResponse = serde_json::from_str(r#"{"objects":[]}"#).unwrap();
        assert!(empty.objects.is_empty());
    }
}
