//! Detection-to-track cost matrices.

use nalgebra::DMatrix;

use crate::boxes::BoundingBox;
use crate::detection::Category;

/// Sentinel cost for pairs that must never associate (category mismatch).
pub const COST_MAX: f64 = f64::MAX;

/// Cost function for detection-to-track association, chosen at construction
/// of the tracker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CostMetric {
    /// `-IoU(track, detection)`: larger overlap means lower cost, consistent
    /// with a minimization-based assignment.
    #[default]
    Iou,
    /// L2 distance between the raw `[left, top, right, bottom]` vectors.
    Euclidean,
}

impl CostMetric {
    /// Build the cost matrix between predicted track boxes and detections.
    ///
    /// `result[(i, j)]` is the cost of assigning detection `j` to track `i`.
    /// Pairs whose category labels differ are forced to [`COST_MAX`] so
    /// cross-category association is impossible regardless of overlap; an
    /// unknown label simply never matches rather than raising an error.
    pub fn cost_matrix(
        &self,
        tracks: &[BoundingBox],
        detections: &[BoundingBox],
        track_categories: &[&Category],
        detection_categories: &[&Category],
    ) -> DMatrix<f64> {
        let mut costs = DMatrix::zeros(tracks.len(), detections.len());

        for i in 0..tracks.len() {
            for j in 0..detections.len() {
                costs[(i, j)] = if track_categories[i].label != detection_categories[j].label {
                    COST_MAX
                } else {
                    match self {
                        CostMetric::Iou => -iou(&tracks[i], &detections[j]),
                        CostMetric::Euclidean => euclidean(&tracks[i], &detections[j]),
                    }
                };
            }
        }

        costs
    }
}

/// Intersection-over-union of two axis-aligned boxes.
///
/// Uses the +1 inclusive-pixel convention on each dimension, so a box covers
/// `(right - left + 1) * (bottom - top + 1)` pixels.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let inter_left = a.left.max(b.left);
    let inter_top = a.top.max(b.top);
    let inter_right = a.right.min(b.right);
    let inter_bottom = a.bottom.min(b.bottom);

    let inter_area = (inter_right - inter_left + 1.0).max(0.0)
        * (inter_bottom - inter_top + 1.0).max(0.0);

    let area_a = (a.right - a.left + 1.0) * (a.bottom - a.top + 1.0);
    let area_b = (b.right - b.left + 1.0) * (b.bottom - b.top + 1.0);

    inter_area / (area_a + area_b - inter_area)
}

fn euclidean(a: &BoundingBox, b: &BoundingBox) -> f64 {
    a.as_array()
        .iter()
        .zip(b.as_array().iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
