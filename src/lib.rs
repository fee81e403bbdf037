//! # Forewarn - Collision-Trend Object Tracking
//!
//! Frame-by-frame multi-object tracking for a forward-facing camera, with an
//! online estimator that converts an object's apparent-width trend into a
//! time-to-collision signal.
//!
//! The pipeline per frame:
//!
//! 1. Raw detections (bounding box + category + confidence) enter through
//!    [`Detection`], validated at the boundary.
//! 2. The [`Tracker`] predicts every live track, builds a cost matrix with a
//!    [`CostMetric`], greedily associates detections to tracks, updates the
//!    matched Kalman filters and drives the track lifecycle
//!    (New -> Mature -> Coasted).
//! 3. The [`CollisionEstimator`] consumes the filtered width of one category
//!    of interest, maintains running statistics and a growth-persistence
//!    counter, and emits a [`TrendReport`] with a time-to-collision estimate
//!    and an alert flag.
//!
//! ## Example
//!
//! ```rust
//! use forewarn::{Category, CostMetric, Detection, Tracker, TrackerConfig};
//!
//! let config = TrackerConfig::new(CostMetric::Iou, 0.2);
//! let mut tracker = Tracker::new(config).unwrap();
//!
//! let det = Detection::new([0.0, 0.0, 10.0, 10.0], Category::new("car", 0.8)).unwrap();
//! let tracks = tracker.update(vec![det]);
//! assert!(tracks.is_empty()); // brand-new tracks are not projected yet
//! ```
//!
//! The tracker is single-threaded and frame-synchronous: one `update` call per
//! inference result, never interleaved. Callers running inference on a worker
//! thread must serialize calls into a tracking session themselves.

pub mod assignment;
pub mod boxes;
pub mod collision;
pub mod detection;
pub mod kalman;
pub mod lowpass;
pub mod metric;
pub mod track;
pub mod tracker;

// Re-exports for convenience
pub use boxes::BoundingBox;
pub use collision::{CollisionConfig, CollisionEstimator, TrendReport};
pub use detection::{sanitize_detections, Category, Detection};
pub use kalman::KalmanFilter;
pub use lowpass::SecondOrderFilter;
pub use metric::CostMetric;
pub use track::{Track, TrackStatus};
pub use tracker::{TrackOutput, Tracker, TrackerConfig};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the forewarn library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid detection: {0}")]
        InvalidDetection(String),

        #[error("Invalid bounding box: left={left}, top={top}, right={right}, bottom={bottom}")]
        InvalidBox {
            left: f64,
            top: f64,
            right: f64,
            bottom: f64,
        },

        #[error("Degenerate filter update: {0}")]
        DegenerateUpdate(String),
    }

    /// Result type for forewarn operations
    pub type Result<T> = std::result::Result<T, Error>;
}
