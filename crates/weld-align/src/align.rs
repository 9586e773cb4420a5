//! End-to-end alignment: detector corners in, poses and an audit snapshot out.

use log::{debug, info, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use weld_align_audit::{
    AlignmentQuality, AlignmentSnapshot, IntrinsicsHash, QualityError, SnapshotError,
};
use weld_align_core::{
    AlignmentPoint, AlignmentSample, CameraIntrinsics, Pose3D, RigidFitParams, Vector3,
};
use weld_align_marker::{solve_marker_pose, DetectedMarker, MarkerPoseParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum AlignError {
    #[error("no pose for marker {id:?}: degenerate corners or unusable calibration")]
    MarkerPoseFailed { id: String },
    #[error("need at least 3 model/world correspondences, have {available}")]
    InsufficientCorrespondences { available: usize },
    #[error("model/world correspondences are degenerate (collinear or coincident)")]
    DegenerateCorrespondences,
    #[error(transparent)]
    Quality(#[from] QualityError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// One detector frame: a single marker seen by a calibrated camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerObservation {
    pub intrinsics: CameraIntrinsics,
    /// Raw detector output; corners may be in any order.
    pub marker: DetectedMarker,
    /// Physical edge length of the marker, in world units.
    pub marker_size: f64,
    /// Camera pose in the world frame. Identity yields camera-relative results.
    #[serde(default)]
    pub camera_pose_world: Pose3D,
    /// Device gravity vector at capture time, recorded verbatim in the snapshot.
    #[serde(default)]
    pub gravity: Vector3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerAlignment {
    pub marker_id: String,
    pub timestamp_ns: i64,
    pub ordered_corners: [Point2<f64>; 4],
    pub pose_camera: Pose3D,
    pub pose_world: Pose3D,
    pub residuals_px: [f64; 4],
    pub iterations: usize,
    pub snapshot: AlignmentSnapshot,
}

/// A marker with a known location on the structural model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchoredMarker {
    pub marker: DetectedMarker,
    pub marker_size: f64,
    /// Marker centre in model coordinates; unanchored markers are ignored.
    #[serde(default)]
    pub model_point: Option<Vector3>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAlignmentRequest {
    pub intrinsics: CameraIntrinsics,
    #[serde(default)]
    pub camera_pose_world: Pose3D,
    #[serde(default)]
    pub markers: Vec<AnchoredMarker>,
    /// Extra correspondences, e.g. manual taps on known model features.
    #[serde(default)]
    pub manual_points: Vec<AlignmentPoint>,
    #[serde(default)]
    pub gravity: Vector3,
    #[serde(default)]
    pub rigid: RigidFitParams,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAlignment {
    /// Model frame expressed in the world frame.
    pub model_pose_world: Pose3D,
    pub rms_error: f64,
    pub max_error: f64,
    pub correspondences: AlignmentSample,
    pub markers: Vec<MarkerAlignment>,
    /// Ids of anchored markers whose pose could not be recovered.
    pub rejected_markers: Vec<String>,
    pub snapshot: AlignmentSnapshot,
}

/// Canonicalize corners, solve the marker pose and snapshot the result.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(id = %obs.marker.id))
)]
pub fn align_marker(
    obs: &MarkerObservation,
    params: &MarkerPoseParams,
) -> Result<MarkerAlignment, AlignError> {
    let hash = IntrinsicsHash::of(&obs.intrinsics);
    let marker = solve_one(
        params,
        &obs.intrinsics,
        &obs.marker,
        obs.marker_size,
        &obs.camera_pose_world,
        &hash,
        obs.gravity,
    )?;
    info!(
        "marker {}: z = {:.4}, max residual {:.3} px",
        marker.marker_id,
        marker.pose_camera.position.z,
        marker.snapshot.reprojection().max_px()
    );
    Ok(marker)
}

/// Fit the model to the world from anchored markers and manual correspondences.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip_all,
        fields(markers = request.markers.len(), manual = request.manual_points.len())
    )
)]
pub fn align_model(
    request: &ModelAlignmentRequest,
    params: &MarkerPoseParams,
) -> Result<ModelAlignment, AlignError> {
    let hash = IntrinsicsHash::of(&request.intrinsics);
    let mut markers = Vec::new();
    let mut rejected_markers = Vec::new();
    let mut sample = AlignmentSample::default();
    let mut residuals = Vec::new();

    for anchored in &request.markers {
        let Some(model_point) = anchored.model_point else {
            debug!("marker {} has no model anchor, skipping", anchored.marker.id);
            continue;
        };
        match solve_one(
            params,
            &request.intrinsics,
            &anchored.marker,
            anchored.marker_size,
            &request.camera_pose_world,
            &hash,
            request.gravity,
        ) {
            Ok(m) => {
                sample.push(AlignmentPoint::new(m.pose_world.position, model_point));
                residuals.extend_from_slice(&m.residuals_px);
                markers.push(m);
            }
            Err(AlignError::MarkerPoseFailed { id }) => {
                warn!("marker {id}: pose rejected, excluded from the fit");
                rejected_markers.push(id);
            }
            Err(other) => return Err(other),
        }
    }
    for p in &request.manual_points {
        sample.push(*p);
    }

    if sample.len() < 3 {
        return Err(AlignError::InsufficientCorrespondences {
            available: sample.len(),
        });
    }
    let fit = sample
        .fit_with(&request.rigid)
        .ok_or(AlignError::DegenerateCorrespondences)?;

    let quality = AlignmentQuality::from_residuals(&residuals)?;
    let snapshot = AlignmentSnapshot::from_hash(hash, quality, request.gravity)?;
    info!(
        "model fit from {} correspondences: rms {:.4}, max {:.4}, {} marker(s) rejected",
        fit.samples,
        fit.rms_error,
        fit.max_error,
        rejected_markers.len()
    );

    Ok(ModelAlignment {
        model_pose_world: fit.pose,
        rms_error: fit.rms_error,
        max_error: fit.max_error,
        correspondences: sample,
        markers,
        rejected_markers,
        snapshot,
    })
}

fn solve_one(
    params: &MarkerPoseParams,
    intrinsics: &CameraIntrinsics,
    raw: &DetectedMarker,
    marker_size: f64,
    camera_pose_world: &Pose3D,
    hash: &IntrinsicsHash,
    gravity: Vector3,
) -> Result<MarkerAlignment, AlignError> {
    let marker = raw.canonicalized();
    let est = solve_marker_pose(params, intrinsics, &marker, marker_size, camera_pose_world)
        .ok_or_else(|| AlignError::MarkerPoseFailed {
            id: marker.id.clone(),
        })?;
    let quality = AlignmentQuality::from_residuals(&est.residuals_px)?;
    let snapshot = AlignmentSnapshot::from_hash(hash.clone(), quality, gravity)?;
    Ok(MarkerAlignment {
        marker_id: marker.id,
        timestamp_ns: marker.timestamp_ns,
        ordered_corners: marker.corners,
        pose_camera: est.pose_camera,
        pose_world: est.pose_world,
        residuals_px: est.residuals_px,
        iterations: est.iterations,
        snapshot,
    })
}
