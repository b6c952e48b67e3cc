use cv_core::nalgebra::{IsometryMatrix3, Matrix3, Point3, Rotation3, Vector3};
use cv_core::WorldToCamera;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The pose of a registered shot, transforming world points into its camera frame.
///
/// On disk this is stored as an axis-angle `rotation` and a `translation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ShotRecord", into = "ShotRecord")]
pub struct ShotPose(pub WorldToCamera);

impl ShotPose {
    /// Creates the pose from an axis-angle rotation and a translation.
    pub fn from_parts(rotation: Vector3<f64>, translation: Vector3<f64>) -> Self {
        Self(WorldToCamera(IsometryMatrix3::from_parts(
            translation.into(),
            Rotation3::new(rotation),
        )))
    }

    /// Creates a level camera (no roll, no pitch) at `center` looking along `forward`.
    ///
    /// The world frame is expected to have Z pointing up.
    pub fn looking_towards(center: Point3<f64>, forward: Vector3<f64>) -> Self {
        let forward = forward.normalize();
        let right = forward.cross(&Vector3::z());
        let right = if right.norm() < 1e-12 {
            Vector3::x()
        } else {
            right.normalize()
        };
        let down = forward.cross(&right);
        let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_rows(&[
            right.transpose(),
            down.transpose(),
            forward.transpose(),
        ]));
        let translation = -(rotation * center.coords);
        Self(WorldToCamera(IsometryMatrix3::from_parts(translation.into(), rotation)))
    }

    pub fn isometry(&self) -> IsometryMatrix3<f64> {
        self.0 .0
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        self.isometry().rotation
    }

    /// The position of the camera in the world.
    pub fn optical_center(&self) -> Point3<f64> {
        self.isometry().inverse_transform_point(&Point3::origin())
    }

    /// The unit vector along which the camera looks, in world coordinates.
    pub fn viewing_direction(&self) -> Vector3<f64> {
        self.rotation().inverse_transform_vector(&Vector3::z())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ShotRecord {
    rotation: [f64; 3],
    translation: [f64; 3],
}

impl From<ShotRecord> for ShotPose {
    fn from(record: ShotRecord) -> Self {
        Self::from_parts(record.rotation.into(), record.translation.into())
    }
}

impl From<ShotPose> for ShotRecord {
    fn from(pose: ShotPose) -> Self {
        let isometry = pose.isometry();
        let rotation = isometry.rotation.scaled_axis();
        let translation = isometry.translation.vector;
        Self {
            rotation: [rotation.x, rotation.y, rotation.z],
            translation: [translation.x, translation.y, translation.z],
        }
    }
}

/// A set of shots registered in the same world frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconstruction {
    pub shots: BTreeMap<String, ShotPose>,
}

impl Reconstruction {
    pub fn add_shot(&mut self, id: impl Into<String>, pose: ShotPose) {
        self.shots.insert(id.into(), pose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn looking_towards_round_trips() {
        let center = Point3::new(3.0, -2.0, 1.5);
        let forward = Vector3::new(1.0, 1.0, 0.0);
        let pose = ShotPose::looking_towards(center, forward);
        assert_relative_eq!(pose.optical_center(), center, epsilon = 1e-12);
        assert_relative_eq!(
            pose.viewing_direction(),
            forward.normalize(),
            epsilon = 1e-12
        );
        assert_relative_eq!(pose.rotation().matrix().determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn camera_down_is_world_down() {
        let pose = ShotPose::looking_towards(Point3::origin(), Vector3::x());
        let down = pose.rotation().inverse_transform_vector(&Vector3::y());
        assert_relative_eq!(down, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn serializes_as_axis_angle() {
        let pose = ShotPose::from_parts(Vector3::new(0.1, -0.2, 0.3), Vector3::new(1.0, 2.0, 3.0));
        let json = serde_json::to_string(&pose).unwrap();
        let back: ShotPose = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(back.isometry(), pose.isometry(), epsilon = 1e-12);
    }
}
