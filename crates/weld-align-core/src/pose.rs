use serde::{Deserialize, Serialize};

use crate::{Quaternion, Vector3};

/// Rigid transform: rotation followed by translation.
///
/// A pose maps points from its child frame into its parent frame:
/// `p_parent = rotation.rotate(p_child) + position`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose3D {
    pub position: Vector3,
    pub rotation: Quaternion,
}

impl Pose3D {
    pub const IDENTITY: Pose3D = Pose3D {
        position: Vector3::ZERO,
        rotation: Quaternion::IDENTITY,
    };

    #[inline]
    pub const fn new(position: Vector3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    /// Apply `child` in this pose's frame (parent-then-child).
    pub fn compose(&self, child: &Pose3D) -> Pose3D {
        Pose3D {
            position: self.position + self.rotation.rotate(child.position),
            rotation: self.rotation.compose(&child.rotation),
        }
    }

    pub fn inverse(&self) -> Pose3D {
        let rotation = self.rotation.conjugate().normalized();
        Pose3D {
            position: -rotation.rotate(self.position),
            rotation,
        }
    }

    /// Map a point from the child frame into the parent frame.
    #[inline]
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        self.rotation.rotate(p) + self.position
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}
