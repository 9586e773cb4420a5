//! Absolute orientation: best-fit rotation and translation between two point sets.
//!
//! The solver is the SVD-based Kabsch/Procrustes construction. It never
//! panics on degenerate input; collinear, coincident or otherwise
//! rank-deficient configurations yield `None`.

use log::debug;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::{Pose3D, Quaternion, Vector3};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tolerances for [`solve_rigid_transform_with`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RigidFitParams {
    /// Minimum ratio between the second and the first singular value of the
    /// cross-covariance. Below it the points are treated as collinear.
    pub min_singular_ratio: f64,
    /// Maximum deviation of `R^T R` from identity and of `det R` from 1.
    pub orthonormality_tol: f64,
}

impl Default for RigidFitParams {
    fn default() -> Self {
        Self {
            min_singular_ratio: 1e-9,
            orthonormality_tol: 1e-6,
        }
    }
}

/// Fitted model-to-world transform plus world-space residual summary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigidFit {
    pub pose: Pose3D,
    pub rms_error: f64,
    pub max_error: f64,
    pub samples: usize,
}

/// Rigid transform `T` minimizing `sum |T(model[i]) - world[i]|^2`.
///
/// Returns `None` for fewer than 3 pairs, mismatched lengths or degenerate
/// geometry.
pub fn solve_rigid_transform(model: &[Vector3], world: &[Vector3]) -> Option<Pose3D> {
    solve_rigid_transform_with(&RigidFitParams::default(), model, world)
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(params, model, world), fields(n = model.len()))
)]
pub fn solve_rigid_transform_with(
    params: &RigidFitParams,
    model: &[Vector3],
    world: &[Vector3],
) -> Option<Pose3D> {
    if model.len() != world.len() {
        debug!(
            "rigid fit: mismatched correspondence lengths ({} model, {} world)",
            model.len(),
            world.len()
        );
        return None;
    }
    if model.len() < 3 {
        debug!("rigid fit: {} correspondences, need at least 3", model.len());
        return None;
    }
    if model.iter().chain(world).any(|p| !p.is_finite()) {
        debug!("rigid fit: non-finite input point");
        return None;
    }

    let c_model: nalgebra::Vector3<f64> = Vector3::centroid(model)?.into();
    let c_world: nalgebra::Vector3<f64> = Vector3::centroid(world)?.into();

    let mut h = Matrix3::<f64>::zeros();
    for (pm, pw) in model.iter().zip(world) {
        let dm = nalgebra::Vector3::from(*pm) - c_model;
        let dw = nalgebra::Vector3::from(*pw) - c_world;
        h += dm * dw.transpose();
    }

    let svd = h.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        debug!("rigid fit: SVD did not converge");
        return None;
    };
    let s = svd.singular_values;

    let mut sorted = [s[0], s[1], s[2]];
    sorted.sort_by(|a, b| b.total_cmp(a));
    if sorted[0] <= 0.0 || sorted[1] <= params.min_singular_ratio * sorted[0] {
        debug!(
            "rigid fit: rank-deficient covariance (singular values {:.3e}, {:.3e}, {:.3e})",
            sorted[0], sorted[1], sorted[2]
        );
        return None;
    }

    let mut v = v_t.transpose();
    let mut r = v * u.transpose();
    if r.determinant() < 0.0 {
        // reflection: flip the axis of the smallest singular value
        let weakest = s.imin();
        v.column_mut(weakest).neg_mut();
        r = v * u.transpose();
    }

    let ortho_err = (r.transpose() * r - Matrix3::identity()).abs().max();
    let det_err = (r.determinant() - 1.0).abs();
    if !(ortho_err.is_finite() && det_err.is_finite())
        || ortho_err > params.orthonormality_tol
        || det_err > params.orthonormality_tol
    {
        debug!("rigid fit: rotation not orthonormal (ortho {ortho_err:.3e}, det {det_err:.3e})");
        return None;
    }

    let t = c_world - r * c_model;
    let pose = Pose3D::new(t.into(), Quaternion::from_rotation_matrix(&r));
    pose.is_finite().then_some(pose)
}

/// Solve and report world-space residuals of the fitted transform.
pub fn fit_rigid_transform(
    params: &RigidFitParams,
    model: &[Vector3],
    world: &[Vector3],
) -> Option<RigidFit> {
    let pose = solve_rigid_transform_with(params, model, world)?;

    let mut sum_sq = 0.0;
    let mut max_error: f64 = 0.0;
    for (pm, pw) in model.iter().zip(world) {
        let e = pose.transform_point(*pm).distance(pw);
        sum_sq += e * e;
        max_error = max_error.max(e);
    }

    Some(RigidFit {
        pose,
        rms_error: (sum_sq / model.len() as f64).sqrt(),
        max_error,
        samples: model.len(),
    })
}
