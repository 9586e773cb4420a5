use serde::{Deserialize, Serialize};

use crate::rigid::{fit_rigid_transform, RigidFit, RigidFitParams};
use crate::Vector3;

/// One model-to-world correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentPoint {
    pub world_point: Vector3,
    pub model_point: Vector3,
}

impl AlignmentPoint {
    pub const fn new(world_point: Vector3, model_point: Vector3) -> Self {
        Self {
            world_point,
            model_point,
        }
    }
}

/// Ordered collection of correspondences.
///
/// Order carries no meaning for the fit but is preserved so logs replay the
/// same input sequence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlignmentSample {
    points: Vec<AlignmentPoint>,
}

impl AlignmentSample {
    pub fn new(points: Vec<AlignmentPoint>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: AlignmentPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[AlignmentPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn model_points(&self) -> Vec<Vector3> {
        self.points.iter().map(|p| p.model_point).collect()
    }

    pub fn world_points(&self) -> Vec<Vector3> {
        self.points.iter().map(|p| p.world_point).collect()
    }

    /// Fit the model-to-world rigid transform with default parameters.
    pub fn fit(&self) -> Option<RigidFit> {
        self.fit_with(&RigidFitParams::default())
    }

    pub fn fit_with(&self, params: &RigidFitParams) -> Option<RigidFit> {
        fit_rigid_transform(params, &self.model_points(), &self.world_points())
    }
}

impl FromIterator<AlignmentPoint> for AlignmentSample {
    fn from_iter<I: IntoIterator<Item = AlignmentPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
