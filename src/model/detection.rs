//! Detection results returned by the fracture detection service.

use serde::{Deserialize, Serialize};

use super::{lenient, lenient_list};

/// Image-level classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Fractured")]
    Fractured,
    #[default]
    #[serde(rename = "Non Fractured")]
    NonFractured,
}

impl Classification {
    /// Display label as sent by the service.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Fractured => "Fractured",
            Classification::NonFractured => "Non Fractured",
        }
    }

    pub fn is_fractured(&self) -> bool {
        matches!(self, Classification::Fractured)
    }
}

/// Axis-aligned box in original-image pixel coordinates.
///
/// Serialized as `[x1, y1, x2, y2]`. Construction normalizes the corners
/// so that `x2 >= x1` and `y2 >= y1` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One predicted fracture location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, deserialize_with = "lenient")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub label: String,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Per-box detector confidence in `[0, 1]`; absent in older payloads
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn new(id: i64, label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id,
            label: label.into(),
            bbox,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Whether this detection is shown at `threshold`.
    ///
    /// Detections without a confidence are always shown.
    pub fn passes(&self, threshold: f32) -> bool {
        self.confidence.is_none_or(|c| c >= threshold)
    }
}

/// The detection service response for one image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    #[serde(rename = "class", default, deserialize_with = "lenient")]
    pub classification: Classification,
    /// Aggregate confidence label, e.g. `"91.23%"`
    #[serde(rename = "confidence", default, deserialize_with = "lenient")]
    pub confidence_label: String,
    #[serde(rename = "recommendation", default, deserialize_with = "lenient")]
    pub recommendation_text: String,
    /// Width of the image the boxes refer to; `0` when unknown
    #[serde(rename = "imageWidth", default, deserialize_with = "lenient")]
    pub original_width: u32,
    /// Height of the image the boxes refer to; `0` when unknown
    #[serde(rename = "imageHeight", default, deserialize_with = "lenient")]
    pub original_height: u32,
    #[serde(default, deserialize_with = "lenient_list")]
    pub detections: Vec<Detection>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl DetectionResult {
    /// Original image size, when both dimensions are known.
    pub fn original_size(&self) -> Option<(u32, u32)> {
        (self.original_width > 0 && self.original_height > 0)
            .then_some((self.original_width, self.original_height))
    }

    /// Detections shown at `threshold`, in their original order.
    pub fn filtered(&self, threshold: f32) -> Vec<&Detection> {
        self.detections
            .iter()
            .filter(|d| d.passes(threshold))
            .collect()
    }
}
