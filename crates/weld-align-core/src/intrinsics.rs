use nalgebra::{Matrix3, Point2};
use serde::{Deserialize, Serialize};

use crate::Vector3;

/// Points closer to the camera plane than this are not projected.
const MIN_DEPTH: f64 = 1e-9;

/// Pinhole camera model in pixel units.
///
/// No invariants are enforced here; callers validate positivity upstream.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub width: i32,
    pub height: i32,
}

impl CameraIntrinsics {
    pub const fn new(fx: f64, fy: f64, cx: f64, cy: f64, width: i32, height: i32) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
        }
    }

    /// The 3x3 camera matrix `K`.
    pub fn camera_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    /// Project a camera-frame point to pixels. `None` at or behind the camera plane.
    #[inline]
    pub fn project(&self, p: Vector3) -> Option<Point2<f64>> {
        if p.z.is_nan() || p.z <= MIN_DEPTH {
            return None;
        }
        Some(Point2::new(
            self.fx * p.x / p.z + self.cx,
            self.fy * p.y / p.z + self.cy,
        ))
    }

    /// Pixel to normalized image coordinates (`K^-1` applied).
    #[inline]
    pub fn normalize(&self, px: Point2<f64>) -> Point2<f64> {
        Point2::new((px.x - self.cx) / self.fx, (px.y - self.cy) / self.fy)
    }

    /// Whether the focal lengths are usable for back-projection.
    pub fn has_valid_focal(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx != 0.0
            && self.fy != 0.0
    }
}
