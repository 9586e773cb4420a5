//! Square fiducial markers: canonical corner ordering and planar pose.
//!
//! Detection itself happens upstream; this crate takes the four pixel
//! corners of a [`DetectedMarker`], puts them into `[TL, TR, BR, BL]` order
//! and recovers the marker pose relative to a calibrated camera.
//!
//! ```
//! use nalgebra::Point2;
//! use weld_align_core::{CameraIntrinsics, Pose3D};
//! use weld_align_marker::{estimate_marker_pose, DetectedMarker};
//!
//! let k = CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0, 640, 480);
//! let marker = DetectedMarker::new(
//!     "m0",
//!     [
//!         Point2::new(380.0, 300.0),
//!         Point2::new(260.0, 180.0),
//!         Point2::new(260.0, 300.0),
//!         Point2::new(380.0, 180.0),
//!     ],
//!     0,
//! )
//! .canonicalized();
//!
//! let pose = estimate_marker_pose(&k, &marker, 0.2, &Pose3D::IDENTITY).unwrap();
//! assert!((pose.position.z - 1.0).abs() < 1e-6);
//! ```

mod ordering;
mod pose;
mod reprojection;
mod types;

pub use ordering::{order_corners_clockwise_from_top_left, order_quad_clockwise_from_top_left};
pub use pose::{estimate_marker_pose, solve_marker_pose, MarkerPoseEstimate, MarkerPoseParams};
pub use reprojection::{marker_object_corners, project_marker_corners, reprojection_residuals};
pub use types::DetectedMarker;
