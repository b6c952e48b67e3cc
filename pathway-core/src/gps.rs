use cv_core::nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis in meters.
const WGS84_B: f64 = 6_356_752.314_245;

/// A GPS position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gps {
    pub latitude: f64,
    pub longitude: f64,
}

impl Gps {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The earth-centered earth-fixed coordinates of this position at zero altitude.
    pub fn ecef(&self) -> Vector3<f64> {
        let a2 = WGS84_A * WGS84_A;
        let b2 = WGS84_B * WGS84_B;
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let l = 1.0 / (a2 * cos_lat * cos_lat + b2 * sin_lat * sin_lat).sqrt();
        Vector3::new(
            a2 * l * cos_lat * cos_lon,
            a2 * l * cos_lat * sin_lon,
            b2 * l * sin_lat,
        )
    }

    /// Straight-line distance in meters between the two positions.
    pub fn distance(&self, other: &Gps) -> f64 {
        (self.ecef() - other.ecef()).norm()
    }
}

/// The metadata extracted from an image's EXIF block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default)]
    pub gps: Option<Gps>,
    /// The identifier of the entry in the camera model table.
    pub camera: String,
    #[serde(default)]
    pub projection_type: ProjectionType,
}

impl ImageMetadata {
    pub fn new(camera: impl Into<String>) -> Self {
        Self {
            gps: None,
            camera: camera.into(),
            projection_type: ProjectionType::default(),
        }
    }

    pub fn with_gps(mut self, latitude: f64, longitude: f64) -> Self {
        self.gps = Some(Gps::new(latitude, longitude));
        self
    }

    pub fn with_projection_type(mut self, projection_type: ProjectionType) -> Self {
        self.projection_type = projection_type;
        self
    }
}

/// The lens projection an image was captured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionType {
    Perspective,
    Fisheye,
    Spherical,
}

impl Default for ProjectionType {
    fn default() -> Self {
        Self::Perspective
    }
}
