use bitarray::BitArray;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A binary feature descriptor compared with the Hamming distance.
pub type Descriptor = BitArray<64>;

/// A correspondence between feature `[0]` of one image and feature `[1]` of another.
pub type FeatureMatch = [usize; 2];

/// The correspondences of one image against each of its partners.
///
/// An empty list is a valid result and means the pair was rejected.
pub type MatchMap = BTreeMap<String, Vec<FeatureMatch>>;

/// The features extracted from one image.
///
/// All three vectors are indexed by the same feature index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    /// Normalized image coordinates of every keypoint.
    pub points: Vec<[f64; 2]>,
    pub descriptors: Vec<Descriptor>,
    pub colors: Vec<[u8; 3]>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keeps only the first `max` features.
    #[must_use]
    pub fn truncated(mut self, max: usize) -> Self {
        self.points.truncate(max);
        self.descriptors.truncate(max);
        self.colors.truncate(max);
        self
    }
}
