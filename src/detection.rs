//! Detection input boundary.
//!
//! Detections are ephemeral: produced once per frame by the upstream
//! inference collaborator, validated here, consumed by the tracker.

use tracing::warn;

use crate::boxes::BoundingBox;
use crate::{Error, Result};

/// Class label plus confidence score for one detection.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    /// Opaque comparable class label.
    pub label: String,
    /// Detector confidence in `[0, 1]`.
    pub score: f64,
}

impl Category {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// One validated per-frame detection.
#[derive(Clone, Debug)]
pub struct Detection {
    /// Detected box in pixel coordinates.
    pub bbox: BoundingBox,
    /// Class label and confidence.
    pub category: Category,
}

impl Detection {
    /// Create a detection, validating the box and score.
    ///
    /// # Arguments
    /// * `ltrb` - Box as `[left, top, right, bottom]`
    /// * `category` - Class label and confidence
    pub fn new(ltrb: [f64; 4], category: Category) -> Result<Self> {
        let bbox = BoundingBox::try_from(ltrb)?;
        if !(0.0..=1.0).contains(&category.score) {
            return Err(Error::InvalidDetection(format!(
                "score {} outside [0, 1] for label {:?}",
                category.score, category.label
            )));
        }
        Ok(Self { bbox, category })
    }
}

/// Validate a raw batch of detections, dropping malformed entries.
///
/// Malformed input (non-positive box extent, score outside `[0, 1]`) is a
/// logged validation failure, not a fatal condition; the rest of the frame
/// still reaches the tracker.
pub fn sanitize_detections(
    raw: impl IntoIterator<Item = ([f64; 4], Category)>,
) -> Vec<Detection> {
    raw.into_iter()
        .filter_map(|(ltrb, category)| match Detection::new(ltrb, category) {
            Ok(det) => Some(det),
            Err(err) => {
                warn!("dropping malformed detection: {err}");
                None
            }
        })
        .collect()
}
