use crate::ProjectionType;
use core::f64::consts::PI;
use cv_core::nalgebra::{Point2, Unit, Vector2, Vector3};
use cv_core::{Bearing as _, CameraModel as _, KeyPoint};
use cv_pinhole::{CameraIntrinsics, CameraIntrinsicsK1Distortion};
use serde::{Deserialize, Serialize};

/// Iterations used when inverting the fisheye radial polynomial.
const UNDISTORT_ITERATIONS: usize = 10;

/// Intrinsic parameters of a camera.
///
/// Keypoints handed to [`CameraModel::bearing`] are normalized image coordinates: the pixel
/// position relative to the image center, divided by the larger image dimension. The focal
/// length uses the same normalization.
///
/// Perspective cameras undistort with `k1` alone. Fisheye cameras apply both `k1` and `k2`
/// to the angle of incidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    #[serde(default)]
    pub projection_type: ProjectionType,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_focal")]
    pub focal: f64,
    #[serde(default)]
    pub k1: f64,
    #[serde(default)]
    pub k2: f64,
}

fn default_focal() -> f64 {
    0.85
}

impl CameraModel {
    pub fn perspective(width: u32, height: u32, focal: f64) -> Self {
        Self {
            projection_type: ProjectionType::Perspective,
            width,
            height,
            focal,
            k1: 0.0,
            k2: 0.0,
        }
    }

    pub fn spherical(width: u32, height: u32) -> Self {
        Self {
            projection_type: ProjectionType::Spherical,
            width,
            height,
            focal: default_focal(),
            k1: 0.0,
            k2: 0.0,
        }
    }

    /// Returns the same intrinsics interpreted under another projection.
    #[must_use]
    pub fn with_projection_type(mut self, projection_type: ProjectionType) -> Self {
        self.projection_type = projection_type;
        self
    }

    /// Extracts the bearing of a normalized keypoint in the camera frame.
    ///
    /// The bearing X axis points right, Y axis points down, and Z axis points forwards.
    pub fn bearing(&self, point: [f64; 2]) -> Unit<Vector3<f64>> {
        let point = Vector2::from(point);
        match self.projection_type {
            ProjectionType::Perspective => self.pinhole().calibrate(KeyPoint(Point2::from(point))).bearing(),
            ProjectionType::Fisheye => {
                let distorted = point / self.focal;
                let theta_distorted = distorted.norm();
                if theta_distorted < f64::EPSILON {
                    return Vector3::z_axis();
                }
                let mut theta = theta_distorted;
                for _ in 0..UNDISTORT_ITERATIONS {
                    theta = theta_distorted / self.radial_scale(theta * theta);
                }
                let planar = distorted / theta_distorted * theta.sin();
                Unit::new_normalize(Vector3::new(planar.x, planar.y, theta.cos()))
            }
            ProjectionType::Spherical => {
                let longitude = point.x * 2.0 * PI;
                let latitude = -point.y * 2.0 * PI;
                let (sin_lat, cos_lat) = latitude.sin_cos();
                let (sin_lon, cos_lon) = longitude.sin_cos();
                Unit::new_normalize(Vector3::new(
                    cos_lat * sin_lon,
                    -sin_lat,
                    cos_lat * cos_lon,
                ))
            }
        }
    }

    /// The pinhole model of a perspective camera, centered on the image.
    pub fn pinhole(&self) -> CameraIntrinsicsK1Distortion {
        CameraIntrinsicsK1Distortion::new(
            CameraIntrinsics::identity().focals(Vector2::new(self.focal, self.focal)),
            self.k1,
        )
    }

    fn radial_scale(&self, r2: f64) -> f64 {
        1.0 + self.k1 * r2 + self.k2 * r2 * r2
    }
}
