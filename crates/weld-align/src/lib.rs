//! Overlay a structural model on a live camera view.
//!
//! This facade re-exports the geometric core, the marker pose estimator and
//! the audit records, and wires them into the end-to-end data flow:
//!
//! detector corners → [`marker::order_corners_clockwise_from_top_left`] →
//! [`marker::solve_marker_pose`] → [`core::solve_rigid_transform`] over
//! model/world correspondences → [`audit::AlignmentSnapshot`].
//!
//! ## Quickstart
//!
//! ```
//! use nalgebra::Point2;
//! use weld_align::{align_marker, DetectedMarker, MarkerObservation, MarkerPoseParams};
//! use weld_align::core::{CameraIntrinsics, Pose3D, Vector3};
//!
//! let obs = MarkerObservation {
//!     intrinsics: CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0, 640, 480),
//!     marker: DetectedMarker::new(
//!         "beam-3",
//!         [
//!             Point2::new(260.0, 180.0),
//!             Point2::new(380.0, 180.0),
//!             Point2::new(380.0, 300.0),
//!             Point2::new(260.0, 300.0),
//!         ],
//!         0,
//!     ),
//!     marker_size: 0.2,
//!     camera_pose_world: Pose3D::IDENTITY,
//!     gravity: Vector3::new(0.0, 9.81, 0.0),
//! };
//!
//! let aligned = align_marker(&obs, &MarkerPoseParams::default()).unwrap();
//! assert_eq!(aligned.snapshot.schema_version(), 1);
//! ```
//!
//! ## API map
//! - `weld_align::core`: vectors, quaternions, poses, intrinsics, homography, rigid solver.
//! - `weld_align::marker`: corner ordering and marker pose.
//! - `weld_align::audit`: intrinsics hash, quality summary, snapshot.
//! - `weld_align::io`: JSON configs and reports used by the `weld-align` binary.

mod align;
pub mod io;

pub use weld_align_audit as audit;
pub use weld_align_core as core;
pub use weld_align_marker as marker;

pub use align::{
    align_marker, align_model, AlignError, AnchoredMarker, MarkerAlignment, MarkerObservation,
    ModelAlignment, ModelAlignmentRequest,
};
pub use weld_align_audit::{AlignmentQuality, AlignmentSnapshot, IntrinsicsHash};
pub use weld_align_core::{AlignmentPoint, AlignmentSample, CameraIntrinsics, Pose3D};
pub use weld_align_marker::{DetectedMarker, MarkerPoseParams};
