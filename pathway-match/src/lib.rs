//! Builds the matching workload of an image collection.
//!
//! Candidate pairs are chosen from image metadata (GPS distance and capture order) by
//! [`CandidateSelector`]. Every candidate pair is then pushed through a series of
//! increasingly expensive stages by [`MatchOrchestrator`], which stops at the first
//! stage that rejects the pair:
//!
//! 1. preemptive matching of a small prefix of the features (optional)
//! 2. symmetric ratio matching of the full feature sets
//! 3. robust geometric verification against the camera models
//!
//! Each image is one unit of work and units run on a fixed-size thread pool.

mod candidates;
mod matcher;
mod orchestrator;
mod settings;

pub use candidates::*;
pub use matcher::*;
pub use orchestrator::*;
pub use settings::*;

use thiserror::Error;

/// The ways a unit of matching work can fail.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("no features available for image {0}")]
    MissingFeatures(String),
    #[error("unable to load features of {image}: {message}")]
    FeatureLoad { image: String, message: String },
    #[error("features of {image} have {points} points but {descriptors} descriptors")]
    InconsistentFeatures {
        image: String,
        points: usize,
        descriptors: usize,
    },
    #[error("no metadata for image {0}")]
    MissingMetadata(String),
    #[error("image {image} references unknown camera model {camera}")]
    MissingCamera { image: String, camera: String },
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("unable to build the matching thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MatchError {
    /// Wraps an error produced by a feature or match store.
    pub fn storage(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
