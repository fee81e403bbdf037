//! A single tracked object: one Kalman filter with a fixed bounding-box
//! motion model, lifecycle counters, and the apparent-width low-pass filter.

use nalgebra::{DMatrix, DVector};

use crate::boxes::BoundingBox;
use crate::detection::Category;
use crate::kalman::KalmanFilter;
use crate::lowpass::SecondOrderFilter;
use crate::Result;

/// Lifecycle state of a track.
///
/// `New` tracks have not yet accumulated enough consecutive detections to be
/// trusted; `Mature` tracks are being matched; `Coasted` tracks are mature
/// tracks currently surviving on prediction alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStatus {
    New,
    Mature,
    Coasted,
}

// State layout: [cx, cy, scale, aspect, v_cx, v_cy, v_scale].
// Aspect ratio carries no velocity term.
const DIM_X: usize = 7;
const DIM_Z: usize = 4;

/// Persistent estimate of one object's position and size across frames.
#[derive(Clone, Debug)]
pub struct Track {
    kf: KalmanFilter,
    status: TrackStatus,
    /// Frames since the last matched detection.
    disappeared: u32,
    /// Consecutive frames matched.
    continuity: u32,
    /// Fixed at creation, never changed.
    category: Category,
    width_filter: SecondOrderFilter,
}

impl Track {
    /// Create a track from its first detection.
    ///
    /// The first four state entries are the box in center/scale/aspect form;
    /// velocities start at zero. Counters start at `{disappeared: 0,
    /// continuity: 1}` with status `New`.
    pub fn new(bbox: &BoundingBox, category: Category) -> Self {
        let mut kf = KalmanFilter::new(DIM_X, DIM_Z);

        // Constant-velocity transition: each of cx, cy, scale is coupled to
        // its velocity entry.
        kf.f = DMatrix::identity(DIM_X, DIM_X);
        kf.f[(0, 4)] = 1.0;
        kf.f[(1, 5)] = 1.0;
        kf.f[(2, 6)] = 1.0;

        // H selects [cx, cy, scale, aspect]; the constructor default already
        // has that shape.

        // Scale and aspect measurements are noisier than the raw pixel
        // jitter on the center.
        kf.r[(2, 2)] = 10.0;
        kf.r[(3, 3)] = 10.0;

        // Moderate initial uncertainty on position/scale, large on the
        // unobservable velocities; aspect ratio stays at the identity value.
        for i in 0..3 {
            kf.p[(i, i)] = 10.0;
        }
        for i in 4..DIM_X {
            kf.p[(i, i)] = 1000.0;
        }

        // Small process noise on the velocity terms only.
        for i in 4..DIM_X {
            kf.q[(i, i)] = 0.01;
        }

        let z = bbox.to_center_form();
        for (i, value) in z.iter().enumerate() {
            kf.x[i] = *value;
        }

        Self {
            kf,
            status: TrackStatus::New,
            disappeared: 0,
            continuity: 1,
            category,
            width_filter: SecondOrderFilter::new(),
        }
    }

    /// Advance the motion model one frame and return the predicted box.
    ///
    /// Called once per frame for every live track, before association. If
    /// scale plus its velocity would go non-positive, the velocity is zeroed
    /// first so the predicted scale cannot degenerate.
    pub fn predict(&mut self) -> BoundingBox {
        if self.kf.x[2] + self.kf.x[6] <= 0.0 {
            self.kf.x[6] = 0.0;
        }
        self.kf.predict();
        self.current_box()
    }

    /// Correct the state with a matched detection.
    ///
    /// Resets the disappearance counter and extends the continuity run. On a
    /// numerically degenerate update the filter state is untouched and the
    /// error is propagated so the caller can treat the track as unmatched.
    pub fn update(&mut self, bbox: &BoundingBox) -> Result<()> {
        let z = DVector::from_row_slice(&bbox.to_center_form());
        self.kf.update(&z)?;
        self.disappeared = 0;
        self.continuity += 1;
        Ok(())
    }

    /// Record a frame with no matching detection.
    pub fn mark_missed(&mut self) {
        self.disappeared += 1;
        self.continuity = 0;
    }

    /// Current state projected back to a box.
    pub fn current_box(&self) -> BoundingBox {
        BoundingBox::from_center_form(self.kf.x.as_slice())
    }

    /// Low-pass-filtered apparent width, or `None` while the track is still
    /// `New` and its width is not yet trustworthy.
    ///
    /// The filter carries two-sample history; calling this more than once per
    /// frame for the same track corrupts that history.
    pub fn filtered_width(&mut self) -> Option<f64> {
        if self.status == TrackStatus::New {
            return None;
        }
        let raw = (self.kf.x[2] / self.kf.x[3]).sqrt();
        Some(self.width_filter.process(raw))
    }

    /// Apply the lifecycle transitions for this cycle.
    ///
    /// `New -> Mature` once the continuity run reaches `maturity_threshold`;
    /// `Mature -> Coasted` when the track was missed this cycle;
    /// `Coasted -> Mature` when it was matched again. There is no transition
    /// back to `New`; an immature missed track is handled by the
    /// disappearance-counter eviction path instead.
    pub fn step_status(&mut self, maturity_threshold: u32) {
        if self.status == TrackStatus::New && self.continuity >= maturity_threshold {
            self.status = TrackStatus::Mature;
        }
        if self.status == TrackStatus::Mature && self.disappeared > 0 {
            self.status = TrackStatus::Coasted;
        }
        if self.status == TrackStatus::Coasted && self.disappeared == 0 {
            self.status = TrackStatus::Mature;
        }
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Frames since the last matched detection.
    pub fn disappeared(&self) -> u32 {
        self.disappeared
    }

    /// Consecutive frames matched.
    pub fn continuity(&self) -> u32 {
        self.continuity
    }
}
