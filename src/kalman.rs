//! Generic discrete-time linear Kalman filter.
//!
//! State-space matrices are public so callers can install their own motion
//! model after construction; dimensions are fixed at construction.

use nalgebra::{DMatrix, DVector};

use crate::{Error, Result};

/// Linear state estimator over an arbitrary state/measurement dimension.
///
/// Every track owns one of these, configured with a constant-velocity
/// bounding-box model (see [`crate::track::Track`]).
#[derive(Clone, Debug)]
pub struct KalmanFilter {
    /// State dimension
    pub dim_x: usize,
    /// Measurement dimension
    pub dim_z: usize,
    /// State vector
    pub x: DVector<f64>,
    /// State covariance matrix
    pub p: DMatrix<f64>,
    /// State transition matrix
    pub f: DMatrix<f64>,
    /// Measurement matrix
    pub h: DMatrix<f64>,
    /// Measurement noise covariance
    pub r: DMatrix<f64>,
    /// Process noise covariance
    pub q: DMatrix<f64>,
}

impl KalmanFilter {
    /// Create a new Kalman filter.
    ///
    /// All matrices start as identities (H as identity in the measurement
    /// rows) and the state as zero, matching a filter that has not yet been
    /// given a motion model.
    ///
    /// # Arguments
    /// * `dim_x` - State dimension
    /// * `dim_z` - Measurement dimension
    pub fn new(dim_x: usize, dim_z: usize) -> Self {
        let mut h = DMatrix::zeros(dim_z, dim_x);
        for i in 0..dim_z.min(dim_x) {
            h[(i, i)] = 1.0;
        }

        Self {
            dim_x,
            dim_z,
            x: DVector::zeros(dim_x),
            p: DMatrix::identity(dim_x, dim_x),
            f: DMatrix::identity(dim_x, dim_x),
            h,
            r: DMatrix::identity(dim_z, dim_z),
            q: DMatrix::identity(dim_x, dim_x),
        }
    }

    /// Predict the next state.
    ///
    /// `x = F x`, `P = F P Fᵀ + Q`. Always succeeds; matrix shapes are fixed
    /// at construction.
    pub fn predict(&mut self) {
        self.x = &self.f * &self.x;
        self.p = &self.f * &self.p * self.f.transpose() + &self.q;
    }

    /// Update the state with a measurement.
    ///
    /// Standard update equations: innovation `y = z - H x`, innovation
    /// covariance `S = H P Hᵀ + R`, gain `K = P Hᵀ S⁻¹`.
    ///
    /// If `S` is singular the update is skipped entirely - state and
    /// covariance are left untouched - and an error is returned so the caller
    /// can treat the track as unmatched this frame instead of propagating NaN
    /// state. With a strictly positive diagonal on `R` (the fixed track
    /// configuration) this cannot happen.
    pub fn update(&mut self, z: &DVector<f64>) -> Result<()> {
        let y = z - &self.h * &self.x;
        let pht = &self.p * self.h.transpose();
        let s = &self.h * &pht + &self.r;

        let s_inv = s
            .try_inverse()
            .ok_or_else(|| Error::DegenerateUpdate("singular innovation covariance".to_string()))?;

        let k = &pht * &s_inv;

        self.x += &k * &y;
        let i = DMatrix::identity(self.dim_x, self.dim_x);
        self.p = (i - &k * &self.h) * &self.p;

        Ok(())
    }
}
