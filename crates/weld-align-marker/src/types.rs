use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::ordering::order_quad_clockwise_from_top_left;

/// A square fiducial as reported by an external detector.
///
/// Corners are pixel coordinates in the order the detector produced them;
/// run [`DetectedMarker::canonicalized`] before solving for pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedMarker {
    pub id: String,
    pub corners: [Point2<f64>; 4],
    pub timestamp_ns: i64,
}

impl DetectedMarker {
    pub fn new(id: impl Into<String>, corners: [Point2<f64>; 4], timestamp_ns: i64) -> Self {
        Self {
            id: id.into(),
            corners,
            timestamp_ns,
        }
    }

    /// Copy with corners in `[TL, TR, BR, BL]` order.
    pub fn canonicalized(&self) -> DetectedMarker {
        DetectedMarker {
            id: self.id.clone(),
            corners: order_quad_clockwise_from_top_left(&self.corners),
            timestamp_ns: self.timestamp_ns,
        }
    }

    /// Mean of the four corners.
    pub fn center(&self) -> Point2<f64> {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(ax, ay), p| (ax + p.x, ay + p.y));
        Point2::new(sx / 4.0, sy / 4.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalized_keeps_identity_fields() {
        let marker = DetectedMarker::new(
            "beam-7",
            [
                Point2::new(380.0, 300.0),
                Point2::new(260.0, 180.0),
                Point2::new(260.0, 300.0),
                Point2::new(380.0, 180.0),
            ],
            1_700_000_000_123,
        );
        let canon = marker.canonicalized();
        assert_eq!(canon.id, "beam-7");
        assert_eq!(canon.timestamp_ns, 1_700_000_000_123);
        assert_eq!(
            canon.corners,
            [
                Point2::new(260.0, 180.0),
                Point2::new(380.0, 180.0),
                Point2::new(380.0, 300.0),
                Point2::new(260.0, 300.0),
            ]
        );
        assert_eq!(canon.center(), Point2::new(320.0, 240.0));
    }

    #[test]
    fn json_uses_camel_case_timestamp() {
        let marker = DetectedMarker::new("m", [Point2::new(0.0, 0.0); 4], 42);
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["timestampNs"], 42);
        assert_eq!(json["corners"][0], serde_json::json!([0.0, 0.0]));
    }
}
