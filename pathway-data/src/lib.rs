//! Reading and writing datasets on the filesystem.
//!
//! A dataset is a directory with the following layout:
//!
//! ```text
//! <dataset>/
//!   config.json             optional options of every stage
//!   exif/<image>.json       image metadata, one file per image
//!   camera_models.json      camera models by identifier
//!   features/<image>.bin    keypoints, descriptors and colors
//!   preemptive/<image>.bin  optional reduced features for preemptive matching
//!   matches/<image>.bin     matches of an image against its candidates
//!   reconstruction.json     registered shots of every reconstruction
//!   navigation_graph.json   navigation graph of every reconstruction
//!   profile.log             duration of each stage run
//! ```
//!
//! Binary files are encoded with `bincode`, the rest is JSON.

mod config;
mod dataset;

pub use config::*;
pub use dataset::*;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("malformed binary data in {path}: {source}")]
    Bincode {
        path: PathBuf,
        source: bincode::Error,
    },
}

impl DataError {
    /// Whether the error is caused by a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
