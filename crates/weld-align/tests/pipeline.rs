use nalgebra::Point2;
use weld_align::core::{Quaternion, RigidFitParams, Vector3};
use weld_align::marker::project_marker_corners;
use weld_align::{
    align_model, AlignError, AlignmentPoint, AnchoredMarker, CameraIntrinsics, DetectedMarker,
    MarkerPoseParams, ModelAlignmentRequest, Pose3D,
};

const K: CameraIntrinsics = CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0, 640, 480);
const MARKER_SIZE: f64 = 0.1;

fn model_pose_world() -> Pose3D {
    Pose3D::new(
        Vector3::new(-0.2, -0.15, 2.0),
        Quaternion::from_axis_angle(Vector3::new(0.0, 1.0, 0.0), 0.3),
    )
}

/// Marker whose centre sits on `model_point`, seen from a camera at `camera_pose_world`.
fn anchored(id: &str, model_point: Vector3, camera_pose_world: &Pose3D) -> AnchoredMarker {
    let truth = model_pose_world();
    let marker_world = Pose3D::new(truth.transform_point(model_point), truth.rotation);
    let marker_camera = camera_pose_world.inverse().compose(&marker_world);
    let corners =
        project_marker_corners(&K, &marker_camera, MARKER_SIZE).expect("marker in view");
    AnchoredMarker {
        marker: DetectedMarker::new(id, [corners[2], corners[0], corners[3], corners[1]], 0),
        marker_size: MARKER_SIZE,
        model_point: Some(model_point),
    }
}

fn request(markers: Vec<AnchoredMarker>, camera_pose_world: Pose3D) -> ModelAlignmentRequest {
    ModelAlignmentRequest {
        intrinsics: K,
        camera_pose_world,
        markers,
        manual_points: Vec::new(),
        gravity: Vector3::new(0.0, 9.81, 0.0),
        rigid: RigidFitParams::default(),
    }
}

fn assert_pose_near(got: &Pose3D, want: &Pose3D, tol: f64) {
    let dist = got.position.distance(&want.position);
    let angle = got.rotation.angle_to(&want.rotation);
    assert!(
        dist <= tol && angle <= tol,
        "position off by {dist:.3e}, rotation off by {angle:.3e}"
    );
}

#[test]
fn four_anchored_markers_recover_the_model_pose() {
    let cam = Pose3D::IDENTITY;
    let markers = vec![
        anchored("a", Vector3::new(0.0, 0.0, 0.0), &cam),
        anchored("b", Vector3::new(0.5, 0.0, 0.0), &cam),
        anchored("c", Vector3::new(0.0, 0.4, 0.0), &cam),
        anchored("d", Vector3::new(0.5, 0.4, 0.2), &cam),
    ];
    let out = align_model(&request(markers, cam), &MarkerPoseParams::default()).unwrap();

    assert_pose_near(&out.model_pose_world, &model_pose_world(), 1e-6);
    assert!(out.rms_error < 1e-6);
    assert_eq!(out.correspondences.len(), 4);
    assert!(out.rejected_markers.is_empty());
    assert_eq!(out.snapshot.reprojection().samples(), 16);
    assert!(out.snapshot.reprojection().max_px() < 1e-6);
    assert_eq!(out.snapshot.intrinsics_hash(), "KgLhy3gmWi5qa2FhF2vVhfY7yU0JP__pS2K7XvjdXBs");
}

#[test]
fn camera_pose_in_world_is_honoured() {
    let cam = Pose3D::new(
        Vector3::new(0.1, 0.05, -0.3),
        Quaternion::from_axis_angle(Vector3::new(1.0, 0.0, 0.0), 0.05),
    );
    let markers = vec![
        anchored("a", Vector3::new(0.0, 0.0, 0.0), &cam),
        anchored("b", Vector3::new(0.4, 0.1, 0.0), &cam),
        anchored("c", Vector3::new(0.1, 0.35, 0.1), &cam),
    ];
    let out = align_model(&request(markers, cam), &MarkerPoseParams::default()).unwrap();

    assert_pose_near(&out.model_pose_world, &model_pose_world(), 1e-6);
    for m in &out.markers {
        assert_pose_near(&cam.compose(&m.pose_camera), &m.pose_world, 1e-9);
    }
}

#[test]
fn rejected_and_unanchored_markers_are_left_out() {
    let cam = Pose3D::IDENTITY;
    let mut unanchored = anchored("loose", Vector3::new(0.2, 0.2, 0.0), &cam);
    unanchored.model_point = None;
    let collapsed = AnchoredMarker {
        marker: DetectedMarker::new("bad", [Point2::new(100.0, 100.0); 4], 0),
        marker_size: MARKER_SIZE,
        model_point: Some(Vector3::new(0.3, 0.3, 0.3)),
    };
    let markers = vec![
        anchored("a", Vector3::new(0.0, 0.0, 0.0), &cam),
        collapsed,
        anchored("b", Vector3::new(0.5, 0.0, 0.0), &cam),
        unanchored,
        anchored("c", Vector3::new(0.0, 0.4, 0.0), &cam),
    ];
    let out = align_model(&request(markers, cam), &MarkerPoseParams::default()).unwrap();

    assert_eq!(out.rejected_markers, vec!["bad".to_string()]);
    let ids: Vec<_> = out.markers.iter().map(|m| m.marker_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_pose_near(&out.model_pose_world, &model_pose_world(), 1e-6);
}

#[test]
fn manual_points_complete_the_correspondence_set() {
    let cam = Pose3D::IDENTITY;
    let truth = model_pose_world();
    let tap = Vector3::new(0.0, 0.4, 0.0);
    let mut req = request(
        vec![
            anchored("a", Vector3::new(0.0, 0.0, 0.0), &cam),
            anchored("b", Vector3::new(0.5, 0.0, 0.0), &cam),
        ],
        cam,
    );
    assert!(matches!(
        align_model(&req, &MarkerPoseParams::default()),
        Err(AlignError::InsufficientCorrespondences { available: 2 })
    ));

    req.manual_points
        .push(AlignmentPoint::new(truth.transform_point(tap), tap));
    let out = align_model(&req, &MarkerPoseParams::default()).unwrap();
    assert_eq!(out.correspondences.len(), 3);
    assert_eq!(out.snapshot.reprojection().samples(), 8);
    assert_pose_near(&out.model_pose_world, &truth, 1e-6);
}

#[test]
fn collinear_anchors_are_degenerate() {
    let cam = Pose3D::IDENTITY;
    let markers = vec![
        anchored("a", Vector3::new(0.0, 0.0, 0.0), &cam),
        anchored("b", Vector3::new(0.25, 0.0, 0.0), &cam),
        anchored("c", Vector3::new(0.5, 0.0, 0.0), &cam),
    ];
    assert!(matches!(
        align_model(&request(markers, cam), &MarkerPoseParams::default()),
        Err(AlignError::DegenerateCorrespondences)
    ));
}
