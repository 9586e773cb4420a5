//! Spatial primitives and geometric solvers for overlaying a structural model
//! on a live camera view.
//!
//! This crate is intentionally small and purely geometric: value types
//! (`Vector3`, `Quaternion`, `Pose3D`, `CameraIntrinsics`), planar
//! homographies and the model-to-world rigid transform solver. It performs
//! no I/O and holds no state; every function is safe to call from any thread.

mod correspondence;
mod homography;
mod intrinsics;
mod logger;
mod pose;
mod quaternion;
mod rigid;
mod vector;

pub use correspondence::{AlignmentPoint, AlignmentSample};
pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use intrinsics::CameraIntrinsics;
pub use pose::Pose3D;
pub use quaternion::Quaternion;
pub use rigid::{
    fit_rigid_transform, solve_rigid_transform, solve_rigid_transform_with, RigidFit,
    RigidFitParams,
};
pub use vector::Vector3;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_filter, init_with_level, LogFilter, LogFilterError};
