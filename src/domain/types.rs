//! Shared types for the footfall core
//!
//! Wire-format structures for detector frames plus the geometric and
//! identity primitives used by the tracker and event layers.

use serde::{Deserialize, Serialize};

/// Minimum simultaneous people for a frame to qualify as a crowd
pub const CROWD_MIN_COUNT: usize = 2;

/// Newtype wrapper for track IDs to provide type safety
///
/// IDs are assigned monotonically by the registry and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct TrackId(pub u64);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned bounding box in pixel coordinates, `(x0, y0)` top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    /// Geometric center of the box - the sole matching feature
    #[inline]
    pub fn centroid(&self) -> Centroid {
        Centroid { x: (self.x0 + self.x1) / 2.0, y: (self.y0 + self.y1) / 2.0 }
    }
}

/// Center point of a detection box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub x: f32,
    pub y: f32,
}

impl Centroid {
    /// Euclidean distance to another centroid
    #[inline]
    pub fn distance_to(&self, other: &Centroid) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One detection as produced by the external person detector
#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub confidence: f32,
    /// Detector class label; frames may omit it when pre-filtered upstream
    #[serde(default = "default_label", alias = "class_label")]
    pub label: String,
}

fn default_label() -> String {
    "person".to_string()
}

/// One frame's detections as received on the ingest channel
///
/// The detector guarantees boxes lie within `[0, width] x [0, height]`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionFrame {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Direction of a counting-line crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Downward crossing - entering the monitored area
    In,
    /// Upward crossing - leaving the monitored area
    Out,
}

impl Direction {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Classification attached to detection log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Normal,
    Crowd,
}

impl Classification {
    /// Classify a frame by how many people it holds
    #[inline]
    pub fn from_count(count: usize) -> Self {
        if count >= CROWD_MIN_COUNT {
            Classification::Crowd
        } else {
            Classification::Normal
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Normal => "normal",
            Classification::Crowd => "crowd",
        }
    }
}
