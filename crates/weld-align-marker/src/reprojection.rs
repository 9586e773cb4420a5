//! Marker geometry in its own frame and pixel reprojection residuals.

use nalgebra::Point2;
use weld_align_core::{CameraIntrinsics, Pose3D, Vector3};

/// Object-space corners of a square marker with edge `size`, in `[TL, TR, BR, BL]` order.
///
/// The marker lies in its `z = 0` plane with `x` to the right and `y` down
/// when viewed from the front, matching image axes for an identity pose.
pub fn marker_object_corners(size: f64) -> [Vector3; 4] {
    let h = size / 2.0;
    [
        Vector3::new(-h, -h, 0.0),
        Vector3::new(h, -h, 0.0),
        Vector3::new(h, h, 0.0),
        Vector3::new(-h, h, 0.0),
    ]
}

/// Project the marker corners for a camera-relative marker pose.
///
/// `None` if any corner is at or behind the camera plane.
pub fn project_marker_corners(
    intrinsics: &CameraIntrinsics,
    pose_camera: &Pose3D,
    size: f64,
) -> Option<[Point2<f64>; 4]> {
    let obj = marker_object_corners(size);
    Some([
        intrinsics.project(pose_camera.transform_point(obj[0]))?,
        intrinsics.project(pose_camera.transform_point(obj[1]))?,
        intrinsics.project(pose_camera.transform_point(obj[2]))?,
        intrinsics.project(pose_camera.transform_point(obj[3]))?,
    ])
}

/// Pixel distance between each observation and its reprojected object point.
///
/// `None` when the slices differ in length or a point does not project.
pub fn reprojection_residuals(
    intrinsics: &CameraIntrinsics,
    pose_camera: &Pose3D,
    object: &[Vector3],
    image: &[Point2<f64>],
) -> Option<Vec<f64>> {
    if object.len() != image.len() {
        return None;
    }
    object
        .iter()
        .zip(image)
        .map(|(p, obs)| {
            let px = intrinsics.project(pose_camera.transform_point(*p))?;
            Some((px - obs).norm())
        })
        .collect()
}
