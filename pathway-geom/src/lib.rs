//! Angle and rotation primitives used to compare camera poses.
//!
//! Planar angles are measured in the XY (ground) plane of a Z-up world frame and are
//! signed so that a positive angle is a clockwise rotation seen from above, which is
//! a turn to the right for an observer standing on the ground:
//!
//! ```text
//!        v1
//!        ^
//!        |   angle > 0
//!        |  /
//!        | /
//!        |/------> v2
//!        O
//! ```
//!
//! All angles are in radians.

use core::f64::consts::PI;
use cv_core::nalgebra::{Rotation3, Vector2, Vector3};
use thiserror::Error;

/// Returned by [`vertical_angle`] when the vector has no direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot compute the vertical angle of a zero-length vector")]
pub struct DegenerateVectorError;

/// Brings an angle in `(-3π, 3π)` back into the principal range by adding or
/// subtracting `2π` once.
fn wrap_once(angle: f64) -> f64 {
    if angle > PI {
        angle - 2.0 * PI
    } else if angle < -PI {
        angle + 2.0 * PI
    } else {
        angle
    }
}

/// The signed angle from `v1` to `v2`, positive when `v2` is clockwise of `v1`.
///
/// The result lies in `(-π, π]`.
pub fn planar_angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> f64 {
    let angle = v1.y.atan2(v1.x) - v2.y.atan2(v2.x);
    if angle > PI {
        angle - 2.0 * PI
    } else if angle <= -PI {
        angle + 2.0 * PI
    } else {
        angle
    }
}

/// The difference `a - b` between two angles, wrapped into `[-π, π]`.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    wrap_once(a - b)
}

/// Applies [`angular_difference`] to every angle in `a`.
pub fn angular_differences(a: &[f64], b: f64) -> Vec<f64> {
    a.iter().map(|&angle| angular_difference(angle, b)).collect()
}

/// The angle between `v` and the horizontal plane, positive when `v` points up.
pub fn vertical_angle(v: &Vector3<f64>) -> Result<f64, DegenerateVectorError> {
    let norm = v.norm();
    if norm == 0.0 {
        return Err(DegenerateVectorError);
    }
    Ok((v.z / norm).clamp(-1.0, 1.0).asin())
}

/// The magnitude of the rotation taking `r` to `r_i`, i.e. the norm of the
/// axis-angle representation of `rᵀ · r_i`.
pub fn rotation_angle_between(r: &Rotation3<f64>, r_i: &Rotation3<f64>) -> f64 {
    let relative = r.matrix().transpose() * r_i.matrix();
    let cos = ((relative.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    // The skew-symmetric part is the axis scaled by twice the sine of the angle.
    let skew = Vector3::new(
        relative[(2, 1)] - relative[(1, 2)],
        relative[(0, 2)] - relative[(2, 0)],
        relative[(1, 0)] - relative[(0, 1)],
    );
    let sin = skew.norm() / 2.0;
    sin.atan2(cos)
}
