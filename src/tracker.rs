//! Per-frame track registry: association, lifecycle, and projection.

use tracing::{debug, warn};

use crate::assignment::greedy_assignment;
use crate::boxes::BoundingBox;
use crate::detection::{Category, Detection};
use crate::metric::CostMetric;
use crate::track::{Track, TrackStatus};
use crate::{Error, Result};

/// Configuration for the tracker, fixed at construction.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Cost function for detection-to-track association.
    pub metric: CostMetric,

    /// Minimum association strength (`|cost|`) for accepting a match.
    pub matching_threshold: f64,

    /// Frames a track may go unmatched before eviction.
    pub max_disappeared: u32,

    /// Minimum detection confidence to spawn a new track.
    pub obj_conf_threshold: f64,

    /// Consecutive matched frames before a `New` track becomes `Mature`.
    pub maturity_threshold: u32,
}

impl TrackerConfig {
    /// Create a configuration with deployment-calibrated defaults for the
    /// remaining parameters.
    pub fn new(metric: CostMetric, matching_threshold: f64) -> Self {
        Self {
            metric,
            matching_threshold,
            max_disappeared: 3,
            obj_conf_threshold: 0.6,
            maturity_threshold: 3,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(CostMetric::Iou, 0.2)
    }
}

/// One tracked object in a frame's output: stable id, current box, category.
#[derive(Clone, Debug)]
pub struct TrackOutput {
    pub id: usize,
    pub bbox: BoundingBox,
    pub category: Category,
}

/// Multi-object tracker.
///
/// Owns the set of live tracks and runs the per-frame cycle: predict every
/// track, associate detections, update matched filters, create and evict
/// tracks, and step the lifecycle state machine.
///
/// The registry is exclusively owned, mutable state: one `update` call per
/// frame, from one thread per tracking session.
pub struct Tracker {
    config: TrackerConfig,
    /// Live tracks in creation order, keyed by stable id.
    tracks: Vec<(usize, Track)>,
}

impl Tracker {
    /// Create a tracker, validating the configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        if config.matching_threshold < 0.0 {
            return Err(Error::InvalidConfig(
                "matching_threshold must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.obj_conf_threshold) {
            return Err(Error::InvalidConfig(
                "obj_conf_threshold must be within [0, 1]".to_string(),
            ));
        }
        if config.maturity_threshold == 0 {
            return Err(Error::InvalidConfig(
                "maturity_threshold must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            config,
            tracks: Vec::new(),
        })
    }

    /// Process one frame of detections.
    ///
    /// Every live track is predicted exactly once, whether or not any
    /// detections arrived. Returns the (id, box, category) tuple for every
    /// track past the `New` stage; the per-track filtered widths are a
    /// parallel query via [`filtered_widths`](Self::filtered_widths).
    pub fn update(&mut self, detections: Vec<Detection>) -> Vec<TrackOutput> {
        let predicted: Vec<BoundingBox> =
            self.tracks.iter_mut().map(|(_, t)| t.predict()).collect();

        if detections.is_empty() {
            self.handle_no_detections();
        } else if self.tracks.is_empty() {
            for det in &detections {
                if det.category.score >= self.config.obj_conf_threshold {
                    self.register(det);
                }
            }
        } else {
            self.associate(&predicted, &detections);
        }

        for (_, track) in &mut self.tracks {
            track.step_status(self.config.maturity_threshold);
        }

        self.project()
    }

    /// Filtered apparent width per live track id, in creation order.
    ///
    /// `None` for tracks still in the `New` stage. The underlying low-pass
    /// filters advance their history on each call, so query this exactly once
    /// per frame, after [`update`](Self::update).
    pub fn filtered_widths(&mut self) -> Vec<(usize, Option<f64>)> {
        self.tracks
            .iter_mut()
            .map(|(id, track)| (*id, track.filtered_width()))
            .collect()
    }

    /// Number of live tracks, including `New` ones.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Drop every track; ids are reassigned from zero afterwards.
    pub fn reset(&mut self) {
        self.tracks.clear();
    }

    // Every track missed the frame: age them all and evict the stale ones.
    fn handle_no_detections(&mut self) {
        for (_, track) in &mut self.tracks {
            track.mark_missed();
        }
        self.evict_stale();
    }

    fn associate(&mut self, predicted: &[BoundingBox], detections: &[Detection]) {
        let track_categories: Vec<&Category> =
            self.tracks.iter().map(|(_, t)| t.category()).collect();
        let detection_boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
        let detection_categories: Vec<&Category> =
            detections.iter().map(|d| &d.category).collect();

        let costs = self.config.metric.cost_matrix(
            predicted,
            &detection_boxes,
            &track_categories,
            &detection_categories,
        );

        let mut row_matched = vec![false; self.tracks.len()];
        let mut col_matched = vec![false; detections.len()];

        for (row, col) in greedy_assignment(&costs) {
            // The match must exceed the minimum association strength; the
            // upper bound also rejects the category-mismatch sentinel.
            let strength = costs[(row, col)].abs();
            if strength <= self.config.matching_threshold || strength > 1.0 {
                continue;
            }

            let (id, track) = &mut self.tracks[row];
            match track.update(&detections[col].bbox) {
                Ok(()) => {
                    row_matched[row] = true;
                    col_matched[col] = true;
                }
                Err(err) => {
                    // Degenerate filter update: skip it and treat the track
                    // as unmatched this frame. The detection stays consumed.
                    warn!("track {id}: {err}");
                    col_matched[col] = true;
                }
            }
        }

        for (row, (_, track)) in self.tracks.iter_mut().enumerate() {
            if !row_matched[row] {
                track.mark_missed();
            }
        }
        self.evict_stale();

        for (col, det) in detections.iter().enumerate() {
            if !col_matched[col] && det.category.score >= self.config.obj_conf_threshold {
                self.register(det);
            }
        }
    }

    // Register a detection as a new track under the lowest unused id. Ids
    // freed by eviction are reused, so a session's id space stays dense.
    fn register(&mut self, detection: &Detection) {
        let mut used: Vec<usize> = self.tracks.iter().map(|(id, _)| *id).collect();
        used.sort_unstable();

        let mut id = 0;
        for key in used {
            if key == id {
                id += 1;
            } else {
                break;
            }
        }

        debug!(id, label = %detection.category.label, "registering track");
        self.tracks
            .push((id, Track::new(&detection.bbox, detection.category.clone())));
    }

    fn evict_stale(&mut self) {
        let max_disappeared = self.config.max_disappeared;
        self.tracks.retain(|(id, track)| {
            let keep = track.disappeared() <= max_disappeared;
            if !keep {
                debug!(id, "evicting stale track");
            }
            keep
        });
    }

    // Frame output: every track past the New stage, in creation order.
    fn project(&self) -> Vec<TrackOutput> {
        self.tracks
            .iter()
            .filter(|(_, track)| track.status() != TrackStatus::New)
            .map(|(id, track)| TrackOutput {
                id: *id,
                bbox: track.current_box(),
                category: track.category().clone(),
            })
            .collect()
    }
}
