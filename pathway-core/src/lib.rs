//! # Pathway Core
//!
//! Common types shared by the crates that turn a structure-from-motion dataset into
//! a matching workload and a navigation graph. This includes image metadata (GPS and
//! camera identifiers), camera models that turn keypoints into bearings, shot poses
//! and reconstructions, and feature sets with their matches.
//!
//! ## Coordinate frames
//!
//! Camera frames follow the usual computer vision convention: the X axis points right,
//! the Y axis points down and the Z axis points forwards out of the optical center.
//! Reconstructions are expressed in a world frame with Z pointing up, so that the XY
//! plane is the ground plane used for planar angles.
//!
//! ```text
//!            Z (up)
//!            |
//!            |   viewing direction
//!            O------------>
//!           /
//!          /
//!         X
//! ```

mod camera;
mod features;
mod gps;
mod pose;

pub use bitarray;
pub use camera::*;
pub use features::*;
pub use gps::*;
pub use cv_core::nalgebra;
pub use pose::*;
