use std::ops::Mul;

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::Vector3;

/// Rotation quaternion in `(x, y, z, w)` order.
///
/// Values produced by this crate are unit length. Raw construction through
/// [`Quaternion::new`] is not normalized so that deserialized audit records
/// round-trip bit for bit; call [`Quaternion::normalized`] when in doubt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`. A zero axis yields the identity.
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Self {
        let axis = axis.normalized();
        if axis == Vector3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Convert a rotation matrix into a unit quaternion with `w >= 0`.
    ///
    /// Uses Shepperd's branch selection on the largest diagonal term, so the
    /// division is always by a well-conditioned value.
    pub fn from_rotation_matrix(m: &Matrix3<f64>) -> Self {
        let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new(
                (m[(2, 1)] - m[(1, 2)]) / s,
                (m[(0, 2)] - m[(2, 0)]) / s,
                (m[(1, 0)] - m[(0, 1)]) / s,
                0.25 * s,
            )
        } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
            let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.0;
            Self::new(
                0.25 * s,
                (m[(0, 1)] + m[(1, 0)]) / s,
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(2, 1)] - m[(1, 2)]) / s,
            )
        } else if m[(1, 1)] > m[(2, 2)] {
            let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.0;
            Self::new(
                (m[(0, 1)] + m[(1, 0)]) / s,
                0.25 * s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                (m[(0, 2)] - m[(2, 0)]) / s,
            )
        } else {
            let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.0;
            Self::new(
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                0.25 * s,
                (m[(1, 0)] - m[(0, 1)]) / s,
            )
        };

        let q = q.normalized();
        if q.w < 0.0 {
            Self::new(-q.x, -q.y, -q.z, -q.w)
        } else {
            q
        }
    }

    /// Rotation matrix of this (assumed unit) quaternion.
    pub fn to_rotation_matrix(&self) -> Matrix3<f64> {
        let Quaternion { x, y, z, w } = *self;
        Matrix3::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - z * w),
            2.0 * (x * z + y * w),
            2.0 * (x * y + z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - x * w),
            2.0 * (x * z - y * w),
            2.0 * (y * z + x * w),
            1.0 - 2.0 * (x * x + y * y),
        )
    }

    #[inline]
    pub fn vector_part(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit quaternion in the same direction. The zero quaternion maps to identity;
    /// NaN and infinite components stay non-finite.
    pub fn normalized(&self) -> Quaternion {
        let n = self.norm();
        if n == 0.0 {
            return Self::IDENTITY;
        }
        Self::new(self.x / n, self.y / n, self.z / n, self.w / n)
    }

    #[inline]
    pub fn conjugate(&self) -> Quaternion {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Inverse rotation: conjugate, then normalize.
    #[inline]
    pub fn inverse(&self) -> Quaternion {
        self.conjugate().normalized()
    }

    /// Hamilton product `self * rhs`, re-normalized.
    ///
    /// The result applies `rhs` first, then `self`.
    pub fn compose(&self, rhs: &Quaternion) -> Quaternion {
        let (a, b) = (self, rhs);
        Self::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
        .normalized()
    }

    /// Rotate `v`: `q v q*` expanded as `v + w t + u × t` with `t = 2 u × v`.
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        let u = self.vector_part();
        let t = u.cross(&v) * 2.0;
        v + t * self.w + u.cross(&t)
    }

    /// Angle in radians of the relative rotation between `self` and `other`, in `[0, pi]`.
    ///
    /// Computed as `2 atan2(|v|, |w|)` of `self^-1 other`, which stays accurate
    /// for nearly identical rotations where `acos` of the dot product does not.
    pub fn angle_to(&self, other: &Quaternion) -> f64 {
        let rel = self.inverse().compose(&other.normalized());
        2.0 * rel.vector_part().norm().atan2(rel.w.abs())
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    #[inline]
    fn mul(self, rhs: Quaternion) -> Quaternion {
        self.compose(&rhs)
    }
}
