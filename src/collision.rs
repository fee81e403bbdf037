//! Collision-trend estimation from the tracked apparent-width history.
//!
//! Watches one category of interest in the tracker's per-frame output and
//! turns the growth trend of its filtered width into a time-to-collision
//! estimate and an alert decision. Rendering and the actual alert action
//! (tone, photo) belong to external collaborators; this module only produces
//! the signal.

use tracing::debug;

use crate::tracker::TrackOutput;

/// Sentinel for "no collision expected". A large finite value rather than an
/// IEEE infinity, consistent with the rest of the cost/threshold arithmetic.
pub const TTC_NONE: f64 = f64::MAX;

// The growth counter saturates so an hour of tailgating cannot overflow it.
const GROWTH_COUNTER_CAP: u32 = 1000;

const MILLIS_TO_SEC: f64 = 1.0e-3;

/// Configuration for the collision-trend estimator.
#[derive(Clone, Debug)]
pub struct CollisionConfig {
    /// Category label to watch (first matching track wins each frame).
    pub label: String,

    /// Consecutive growth frames before growth counts as persistent.
    pub persistence_threshold: u32,

    /// Alert when the time-to-collision estimate drops below this (seconds).
    pub alert_ttc_seconds: f64,
}

impl CollisionConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            persistence_threshold: 3,
            alert_ttc_seconds: 2.0,
        }
    }
}

/// Per-frame output of the estimator: the collision-risk signal plus the
/// diagnostic values suitable for logging or on-screen display.
#[derive(Clone, Debug)]
pub struct TrendReport {
    /// Filtered width this frame, if the category was present and its track
    /// was past the `New` stage.
    pub width: Option<f64>,

    /// `width / previous width`, 0.0 when no valid previous width exists.
    pub width_ratio: f64,

    /// Running mean of the filtered width.
    pub mean: f64,

    /// Sample standard deviation of the filtered width; `None` until two
    /// samples have been observed.
    pub std_dev: Option<f64>,

    /// Milliseconds since the previous observation of this category.
    pub time_gap_ms: u64,

    /// Time-to-collision estimate in seconds, [`TTC_NONE`] when the width is
    /// not growing persistently.
    pub ttc_seconds: f64,

    /// The width has grown for at least `persistence_threshold` consecutive
    /// frames.
    pub persistent_growth: bool,

    /// Time-to-collision dropped below the alert threshold; the caller owns
    /// the actual alert action.
    pub alert: bool,

    /// True exactly once: the first frame ever that the watched category was
    /// seen.
    pub first_sighting: bool,
}

/// Online estimator of collision risk for one category of interest.
///
/// Maintains Welford running statistics over the filtered width, a saturating
/// counter of consecutive growth frames, and the previous width/timestamp
/// needed for the ratio and time-gap computations.
pub struct CollisionEstimator {
    config: CollisionConfig,
    /// Welford state: sample count, running mean, sum of squared deviations.
    count: u32,
    mean: f64,
    m2: f64,
    /// Previous filtered width; `None` means no valid previous measurement.
    prev_width: Option<f64>,
    prev_timestamp_ms: Option<u64>,
    growth_count: u32,
    seen: bool,
}

impl CollisionEstimator {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            count: 0,
            mean: 0.0,
            m2: 0.0,
            prev_width: None,
            prev_timestamp_ms: None,
            growth_count: 0,
            seen: false,
        }
    }

    /// Consume one frame of tracker output.
    ///
    /// `widths` is the parallel filtered-width query from
    /// [`Tracker::filtered_widths`](crate::Tracker::filtered_widths);
    /// `timestamp_ms` is the caller's wall clock for this frame in
    /// milliseconds.
    pub fn observe(
        &mut self,
        tracks: &[TrackOutput],
        widths: &[(usize, Option<f64>)],
        timestamp_ms: u64,
    ) -> TrendReport {
        // First match wins; multiple instances of the category are not
        // aggregated.
        let hit = tracks
            .iter()
            .find(|t| t.category.label == self.config.label);

        let Some(track) = hit else {
            // Category absent: the previous width is no longer a valid
            // baseline, but the running statistics survive.
            self.prev_width = None;
            return self.quiet_report();
        };

        let first_sighting = !self.seen;
        self.seen = true;

        let width = widths
            .iter()
            .find(|(id, _)| *id == track.id)
            .and_then(|(_, w)| *w);

        let mut ratio = 0.0;
        if let Some(width) = width {
            match self.prev_width {
                Some(prev) if prev != 0.0 => {
                    ratio = width / prev;
                    // Welford update
                    self.count += 1;
                    let delta = width - self.mean;
                    self.mean += delta / self.count as f64;
                    let delta2 = width - self.mean;
                    self.m2 += delta * delta2;
                }
                _ => {
                    // First usable observation: restart the running stats.
                    self.count = 1;
                    self.mean = width;
                    self.m2 = 0.0;
                }
            }
        }

        if ratio > 1.0 {
            self.growth_count = (self.growth_count + 1).min(GROWTH_COUNTER_CAP);
        } else {
            self.growth_count = 0;
        }
        let persistent_growth = self.growth_count >= self.config.persistence_threshold;

        let time_gap_ms = match self.prev_timestamp_ms {
            Some(prev) => timestamp_ms.saturating_sub(prev),
            None => 0,
        };

        let ttc_seconds = if persistent_growth {
            time_gap_ms as f64 * MILLIS_TO_SEC / (ratio - 1.0)
        } else {
            TTC_NONE
        };

        let alert = ttc_seconds < self.config.alert_ttc_seconds;

        self.prev_width = width;
        self.prev_timestamp_ms = Some(timestamp_ms);

        let report = TrendReport {
            width,
            width_ratio: ratio,
            mean: self.mean,
            std_dev: self.std_dev(),
            time_gap_ms,
            ttc_seconds,
            persistent_growth,
            alert,
            first_sighting,
        };
        debug!(
            label = %self.config.label,
            width = ?report.width,
            mean = report.mean,
            std_dev = ?report.std_dev,
            time_gap_ms = report.time_gap_ms,
            ttc_seconds = report.ttc_seconds,
            "collision trend"
        );
        report
    }

    /// Sample standard deviation of the observed widths, `None` with fewer
    /// than two samples.
    pub fn std_dev(&self) -> Option<f64> {
        if self.count < 2 {
            None
        } else {
            Some((self.m2 / (self.count - 1) as f64).sqrt())
        }
    }

    /// Running mean of the observed widths.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    fn quiet_report(&self) -> TrendReport {
        TrendReport {
            width: None,
            width_ratio: 0.0,
            mean: self.mean,
            std_dev: self.std_dev(),
            time_gap_ms: 0,
            ttc_seconds: TTC_NONE,
            persistent_growth: false,
            alert: false,
            first_sighting: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::BoundingBox;
    use crate::detection::Category;
    use approx::assert_relative_eq;

    fn car_output(id: usize) -> Vec<TrackOutput> {
        vec![TrackOutput {
            id,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap(),
            category: Category::new("car", 0.9),
        }]
    }

    fn estimator() -> CollisionEstimator {
        CollisionEstimator::new(CollisionConfig::new("car"))
    }

    #[test]
    fn test_absent_category_is_quiet() {
        let mut est = estimator();
        let report = est.observe(&[], &[], 0);

        assert_eq!(report.ttc_seconds, TTC_NONE);
        assert!(!report.alert);
        assert!(!report.first_sighting);
    }

    #[test]
    fn test_first_sighting_latch() {
        let mut est = estimator();

        let report = est.observe(&car_output(0), &[(0, Some(10.0))], 0);
        assert!(report.first_sighting);

        let report = est.observe(&car_output(0), &[(0, Some(10.0))], 100);
        assert!(!report.first_sighting);

        // Absence does not re-arm the latch
        est.observe(&[], &[], 200);
        let report = est.observe(&car_output(0), &[(0, Some(10.0))], 300);
        assert!(!report.first_sighting);
    }

    #[test]
    fn test_welford_constant_sequence() {
        let mut est = estimator();

        // First sample is the non-counted baseline reset
        est.observe(&car_output(0), &[(0, Some(10.0))], 0);
        for i in 1..=3 {
            est.observe(&car_output(0), &[(0, Some(10.0))], i * 100);
        }

        assert_relative_eq!(est.mean(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(est.std_dev().unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_welford_two_samples() {
        let mut est = estimator();

        est.observe(&car_output(0), &[(0, Some(5.0))], 0);
        assert!(est.std_dev().is_none()); // count = 1

        est.observe(&car_output(0), &[(0, Some(15.0))], 100);

        // Samples {5, 15}: mean 10, sample variance 50
        assert_relative_eq!(est.mean(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(est.std_dev().unwrap(), 50.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_growth_persistence_and_ttc() {
        let mut est = estimator();

        // Constant-ratio growth r = 1.2 with 100 ms gaps
        let mut width = 10.0;
        let mut reports = Vec::new();
        for frame in 0..5 {
            let report = est.observe(&car_output(0), &[(0, Some(width))], frame * 100);
            reports.push(report);
            width *= 1.2;
        }

        // Frame 0 is the baseline; growth frames start at frame 1, so the
        // counter reaches 3 on frame 3
        assert!(!reports[1].persistent_growth);
        assert!(!reports[2].persistent_growth);
        assert!(reports[3].persistent_growth);

        // ttc = dt / (r - 1) = 0.1 / 0.2 = 0.5 s, below the 2 s alert line
        assert_relative_eq!(reports[3].ttc_seconds, 0.5, epsilon = 1e-9);
        assert!(reports[3].alert);
        assert!(reports[4].alert);
        assert_eq!(reports[2].ttc_seconds, TTC_NONE);
        assert!(!reports[2].alert);
    }

    #[test]
    fn test_shrinking_width_resets_counter() {
        let mut est = estimator();

        let widths = [10.0, 12.0, 14.4, 14.0, 16.8, 20.2];
        for (frame, w) in widths.iter().enumerate() {
            est.observe(&car_output(0), &[(0, Some(*w))], frame as u64 * 100);
        }

        // The dip at frame 3 reset the counter; only two growth frames since
        assert_eq!(est.growth_count, 2);
    }

    #[test]
    fn test_absence_resets_width_baseline_not_stats() {
        let mut est = estimator();

        est.observe(&car_output(0), &[(0, Some(10.0))], 0);
        est.observe(&car_output(0), &[(0, Some(10.0))], 100);
        let count_before = est.count;

        est.observe(&[], &[], 200);
        assert_eq!(est.count, count_before); // stats untouched

        // Reappearance restarts the baseline instead of computing a ratio
        let report = est.observe(&car_output(0), &[(0, Some(50.0))], 300);
        assert_eq!(report.width_ratio, 0.0);
        assert_eq!(est.count, 1);
    }

    #[test]
    fn test_unavailable_width_present_category() {
        let mut est = estimator();

        est.observe(&car_output(0), &[(0, Some(10.0))], 0);
        est.observe(&car_output(0), &[(0, Some(12.0))], 100);

        // Track regressed to an unavailable width: no ratio, counter resets
        let report = est.observe(&car_output(0), &[(0, None)], 200);
        assert_eq!(report.width, None);
        assert_eq!(report.width_ratio, 0.0);
        assert_eq!(report.ttc_seconds, TTC_NONE);
        assert_eq!(est.growth_count, 0);
    }
}
