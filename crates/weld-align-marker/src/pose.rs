//! Planar pose of a square marker from its four image corners.
//!
//! Pipeline:
//! - validate the quad (finite, strictly convex, clockwise, non-zero area),
//! - pixel corners to normalized image coordinates,
//! - exact 4-point homography from the marker plane,
//! - homography decomposition into `[r1 r2 t]` and projection onto SO(3),
//! - Levenberg-Marquardt refinement of the pixel reprojection error.

use log::debug;
use nalgebra::{Matrix3, Point2, Rotation3, SMatrix, SVector, Vector3 as NaVector3};
use serde::{Deserialize, Serialize};
use weld_align_core::{homography_from_4pt, CameraIntrinsics, Pose3D, Quaternion};

use crate::reprojection::marker_object_corners;
use crate::DetectedMarker;

#[cfg(feature = "tracing")]
use tracing::instrument;

const MIN_DEPTH: f64 = 1e-9;

/// Settings for [`solve_marker_pose`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MarkerPoseParams {
    /// Upper bound on refinement iterations; `0` keeps the homography pose.
    pub max_iterations: usize,
    /// Quads with a smaller image area (px^2) are rejected as degenerate.
    pub min_quad_area_px: f64,
    /// Refinement stops once the parameter step norm drops below this.
    pub step_tolerance: f64,
    /// Initial Levenberg-Marquardt damping.
    pub initial_damping: f64,
}

impl Default for MarkerPoseParams {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            min_quad_area_px: 1e-6,
            step_tolerance: 1e-12,
            initial_damping: 1e-3,
        }
    }
}

/// Marker pose with diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPoseEstimate {
    /// Marker frame expressed in the camera frame.
    pub pose_camera: Pose3D,
    /// Marker frame expressed in the frame of `camera_pose_world`.
    pub pose_world: Pose3D,
    /// Per-corner pixel reprojection error, `[TL, TR, BR, BL]`.
    pub residuals_px: [f64; 4],
    /// Accepted refinement steps.
    pub iterations: usize,
}

/// Recover the pose of a square marker of edge `marker_size` (same units as the result).
///
/// `marker.corners` must already be in `[TL, TR, BR, BL]` order. The returned
/// pose is `camera_pose_world ∘ pose_camera`; pass [`Pose3D::IDENTITY`] for a
/// camera-relative pose. Degenerate input yields `None`.
pub fn estimate_marker_pose(
    intrinsics: &CameraIntrinsics,
    marker: &DetectedMarker,
    marker_size: f64,
    camera_pose_world: &Pose3D,
) -> Option<Pose3D> {
    solve_marker_pose(
        &MarkerPoseParams::default(),
        intrinsics,
        marker,
        marker_size,
        camera_pose_world,
    )
    .map(|est| est.pose_world)
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(params, intrinsics, marker, camera_pose_world), fields(id = %marker.id))
)]
pub fn solve_marker_pose(
    params: &MarkerPoseParams,
    intrinsics: &CameraIntrinsics,
    marker: &DetectedMarker,
    marker_size: f64,
    camera_pose_world: &Pose3D,
) -> Option<MarkerPoseEstimate> {
    if !marker_size.is_finite() || marker_size <= 0.0 {
        debug!("marker {}: invalid marker size {marker_size}", marker.id);
        return None;
    }
    if !intrinsics.has_valid_focal() {
        debug!("marker {}: unusable intrinsics {intrinsics:?}", marker.id);
        return None;
    }
    if !is_valid_quad(&marker.corners, params.min_quad_area_px) {
        debug!(
            "marker {}: degenerate or non-clockwise quad {:?}",
            marker.id, marker.corners
        );
        return None;
    }

    let object = marker_object_corners(marker_size).map(NaVector3::from);
    let Some((r0, t0)) = initial_pose(intrinsics, &marker.corners, marker_size / 2.0) else {
        debug!("marker {}: homography decomposition failed", marker.id);
        return None;
    };

    let problem = Reprojection {
        intrinsics,
        object: &object,
        image: &marker.corners,
    };
    let refined = problem.refine(params, r0, t0)?;

    let pose_camera = Pose3D::new(refined.t.into(), Quaternion::from_rotation_matrix(&refined.r));
    if !pose_camera.is_finite() || pose_camera.position.z <= MIN_DEPTH {
        debug!("marker {}: solution behind camera or non-finite", marker.id);
        return None;
    }

    let residuals_px = [0, 1, 2, 3].map(|k| refined.residual.fixed_rows::<2>(2 * k).norm());
    Some(MarkerPoseEstimate {
        pose_camera,
        pose_world: camera_pose_world.compose(&pose_camera),
        residuals_px,
        iterations: refined.iterations,
    })
}

/// Strictly convex, clockwise (y down), with area above `min_area`.
fn is_valid_quad(c: &[Point2<f64>; 4], min_area: f64) -> bool {
    if c.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return false;
    }
    for k in 0..4 {
        let a = c[k];
        let b = c[(k + 1) % 4];
        let d = c[(k + 2) % 4];
        let e1 = b - a;
        let e2 = d - b;
        if e1.x * e2.y - e1.y * e2.x <= 0.0 {
            return false;
        }
    }
    let twice_area: f64 = (0..4)
        .map(|k| {
            let p = c[k];
            let q = c[(k + 1) % 4];
            p.x * q.y - q.x * p.y
        })
        .sum();
    twice_area * 0.5 > min_area
}

/// Closed-form pose from the plane-to-image homography.
fn initial_pose(
    intrinsics: &CameraIntrinsics,
    corners: &[Point2<f64>; 4],
    half: f64,
) -> Option<(Matrix3<f64>, NaVector3<f64>)> {
    let src = [
        Point2::new(-half, -half),
        Point2::new(half, -half),
        Point2::new(half, half),
        Point2::new(-half, half),
    ];
    let dst = corners.map(|p| intrinsics.normalize(p));
    let h = homography_from_4pt(&src, &dst)?.h;

    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let lambda = 0.5 * (h1.norm() + h2.norm());
    if !lambda.is_finite() || lambda < 1e-12 {
        return None;
    }
    let (mut r1, mut r2, mut t) = (h1 / lambda, h2 / lambda, h3 / lambda);
    // H is defined up to sign; the marker must sit in front of the camera
    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }
    let r3 = r1.cross(&r2);

    let raw = Matrix3::from_columns(&[r1, r2, r3]);
    let svd = raw.svd(true, true);
    let (mut u, v_t) = (svd.u?, svd.v_t?);
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        u.column_mut(svd.singular_values.imin()).neg_mut();
        r = u * v_t;
    }
    Some((r, t))
}

struct Refined {
    r: Matrix3<f64>,
    t: NaVector3<f64>,
    residual: SVector<f64, 8>,
    iterations: usize,
}

struct Reprojection<'a> {
    intrinsics: &'a CameraIntrinsics,
    object: &'a [NaVector3<f64>; 4],
    image: &'a [Point2<f64>; 4],
}

impl Reprojection<'_> {
    /// Stacked pixel residuals `projected - observed`, `None` if a point is behind the camera.
    fn residual(&self, r: &Matrix3<f64>, t: &NaVector3<f64>) -> Option<SVector<f64, 8>> {
        let k = self.intrinsics;
        let mut out = SVector::<f64, 8>::zeros();
        for (i, (x, obs)) in self.object.iter().zip(self.image).enumerate() {
            let pc = r * x + t;
            if pc.z <= MIN_DEPTH {
                return None;
            }
            out[2 * i] = k.fx * pc.x / pc.z + k.cx - obs.x;
            out[2 * i + 1] = k.fy * pc.y / pc.z + k.cy - obs.y;
        }
        Some(out)
    }

    /// Jacobian w.r.t. `[omega | dt]` for the update `R <- exp(omega) R`, `t <- t + dt`.
    fn jacobian(&self, r: &Matrix3<f64>, t: &NaVector3<f64>) -> SMatrix<f64, 8, 6> {
        let k = self.intrinsics;
        let mut jac = SMatrix::<f64, 8, 6>::zeros();
        for (i, x) in self.object.iter().enumerate() {
            let rx = r * x;
            let pc = rx + t;
            let iz = 1.0 / pc.z;
            let d_proj = SMatrix::<f64, 2, 3>::new(
                k.fx * iz,
                0.0,
                -k.fx * pc.x * iz * iz,
                0.0,
                k.fy * iz,
                -k.fy * pc.y * iz * iz,
            );
            jac.fixed_view_mut::<2, 3>(2 * i, 0)
                .copy_from(&(d_proj * -rx.cross_matrix()));
            jac.fixed_view_mut::<2, 3>(2 * i, 3).copy_from(&d_proj);
        }
        jac
    }

    fn refine(
        &self,
        params: &MarkerPoseParams,
        mut r: Matrix3<f64>,
        mut t: NaVector3<f64>,
    ) -> Option<Refined> {
        let mut residual = self.residual(&r, &t)?;
        let mut cost = residual.norm_squared();
        let mut damping = params.initial_damping;
        let mut iterations = 0;

        for _ in 0..params.max_iterations {
            if cost < 1e-24 || damping > 1e12 {
                break;
            }

            let jac = self.jacobian(&r, &t);
            let jtj = jac.transpose() * jac;
            let grad = jac.transpose() * residual;

            let mut lhs = jtj;
            for d in 0..6 {
                lhs[(d, d)] += damping * (jtj[(d, d)] + 1e-9);
            }
            let Some(chol) = lhs.cholesky() else {
                damping *= 10.0;
                continue;
            };
            let step = chol.solve(&(-grad));

            let omega = step.fixed_rows::<3>(0).into_owned();
            let r_new = Rotation3::new(omega).into_inner() * r;
            let t_new = t + step.fixed_rows::<3>(3);

            match self.residual(&r_new, &t_new) {
                Some(res_new) if res_new.norm_squared() < cost => {
                    r = r_new;
                    t = t_new;
                    residual = res_new;
                    cost = residual.norm_squared();
                    damping = (damping * 0.3).max(1e-12);
                    iterations += 1;
                    if step.norm() < params.step_tolerance {
                        break;
                    }
                }
                _ => damping *= 10.0,
            }
        }

        Some(Refined {
            r,
            t,
            residual,
            iterations,
        })
    }
}
