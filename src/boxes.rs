//! Axis-aligned bounding boxes and the center/scale/aspect representation
//! used by the track motion model.

use crate::{Error, Result};

/// Axis-aligned box in pixel coordinates, `left < right` and `top < bottom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    /// Create a validated bounding box.
    ///
    /// The upstream detector constructs boxes with positive extent, but that
    /// is not guaranteed at this boundary, so degenerate boxes are rejected
    /// here.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Result<Self> {
        if !(left < right && top < bottom)
            || !left.is_finite()
            || !top.is_finite()
            || !right.is_finite()
            || !bottom.is_finite()
        {
            return Err(Error::InvalidBox {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Box width in pixels.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Box height in pixels.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Convert to the `[cx, cy, scale, aspect]` measurement form, where
    /// `scale = width * height` and `aspect = width / height`.
    pub fn to_center_form(&self) -> [f64; 4] {
        let w = self.width();
        let h = self.height();
        [
            self.left + w / 2.0,
            self.top + h / 2.0,
            w * h,
            w / h,
        ]
    }

    /// Convert back from the `[cx, cy, scale, aspect]` form.
    ///
    /// Used to project filter state into a box; the result is not validated
    /// because a predicted state may legitimately have drifted.
    pub fn from_center_form(state: &[f64]) -> Self {
        let w = (state[2] * state[3]).sqrt();
        let h = state[2] / w;
        Self {
            left: state[0] - w / 2.0,
            top: state[1] - h / 2.0,
            right: state[0] + w / 2.0,
            bottom: state[1] + h / 2.0,
        }
    }

    /// The box as a `[left, top, right, bottom]` array.
    pub fn as_array(&self) -> [f64; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = Error;

    fn try_from(ltrb: [f64; 4]) -> Result<Self> {
        Self::new(ltrb[0], ltrb[1], ltrb[2], ltrb[3])
    }
}
