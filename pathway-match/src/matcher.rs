use arrsac::Arrsac;
use cv_core::sample_consensus::{Consensus, Estimator};
use eight_point::EightPoint;
use log::*;
use pathway_core::{bitarray::Hamming, CameraModel, Descriptor, FeatureMatch};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use space::{Knn, LinearKnn};
use std::sync::Arc;

/// A searchable set of descriptors, built once per image and shared by all of its pairs.
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    descriptors: Arc<[Descriptor]>,
}

impl FeatureIndex {
    pub fn new(descriptors: &[Descriptor]) -> Self {
        Self {
            descriptors: descriptors.into(),
        }
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Finds the best match in the index for every query descriptor.
    ///
    /// A match is only kept if it is closer than `ratio` times the distance of the
    /// second best match.
    pub fn ratio_matches(&self, queries: &[Descriptor], ratio: f64) -> Vec<Option<usize>> {
        ratio_matching(queries, &self.descriptors, ratio)
    }
}

fn ratio_matching(a: &[Descriptor], b: &[Descriptor], ratio: f64) -> Vec<Option<usize>> {
    let knn_b = LinearKnn {
        metric: Hamming,
        iter: b.iter(),
    };
    a.iter()
        .map(|descriptor| {
            let neighbors = knn_b.knn(descriptor, 2);
            if neighbors.len() < 2 {
                return None;
            }
            let (best, second) = (&neighbors[0], &neighbors[1]);
            ((best.distance as f64) < ratio * second.distance as f64).then(|| best.index)
        })
        .collect()
}

/// The correspondence search and verification used by the matching stages.
pub trait GeometricMatcher: Sync {
    /// Matches `a` against `b` in one direction with a ratio test.
    fn match_lowe(&self, a: &[Descriptor], b: &[Descriptor], ratio: f64) -> Vec<FeatureMatch>;

    /// Matches keeping only pairs that are each other's ratio-tested best match.
    fn match_symmetric(&self, a: &FeatureIndex, b: &FeatureIndex, ratio: f64)
        -> Vec<FeatureMatch>;

    /// Keeps the matches consistent with a single relative pose between the two cameras.
    ///
    /// `points_a` and `points_b` are the normalized keypoints the matches index into. Every
    /// match must be in range of both.
    fn robust_match(
        &self,
        points_a: &[[f64; 2]],
        points_b: &[[f64; 2]],
        camera_a: &CameraModel,
        camera_b: &CameraModel,
        matches: &[FeatureMatch],
        threshold: f64,
    ) -> Vec<FeatureMatch>;
}

/// Brute-force Hamming matching with essential matrix verification.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorMatcher {
    /// Seeds the sample consensus of every pair, so results do not depend on scheduling.
    pub seed: u64,
    pub estimator: EightPoint,
}

impl DescriptorMatcher {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            estimator: EightPoint::new(),
        }
    }
}

impl Default for DescriptorMatcher {
    fn default() -> Self {
        Self::new(5)
    }
}

impl GeometricMatcher for DescriptorMatcher {
    fn match_lowe(&self, a: &[Descriptor], b: &[Descriptor], ratio: f64) -> Vec<FeatureMatch> {
        ratio_matching(a, b, ratio)
            .into_iter()
            .enumerate()
            .filter_map(|(aix, bix)| bix.map(|bix| [aix, bix]))
            .collect()
    }

    fn match_symmetric(
        &self,
        a: &FeatureIndex,
        b: &FeatureIndex,
        ratio: f64,
    ) -> Vec<FeatureMatch> {
        // The best match for each feature in a to b's features.
        let forward_matches = b.ratio_matches(a.descriptors(), ratio);
        // The best match for each feature in b to a's features.
        let reverse_matches = a.ratio_matches(b.descriptors(), ratio);
        forward_matches
            .into_iter()
            .enumerate()
            .filter_map(|(aix, bix)| {
                bix.map(|bix| [aix, bix])
                    .filter(|&[aix, bix]| reverse_matches[bix] == Some(aix))
            })
            .collect()
    }

    fn robust_match(
        &self,
        points_a: &[[f64; 2]],
        points_b: &[[f64; 2]],
        camera_a: &CameraModel,
        camera_b: &CameraModel,
        matches: &[FeatureMatch],
        threshold: f64,
    ) -> Vec<FeatureMatch> {
        if matches.len() < EightPoint::MIN_SAMPLES {
            return vec![];
        }
        // Use the camera models to compute the bearing of every matched keypoint.
        let bearings: Vec<_> = matches
            .iter()
            .map(|&[a, b]| {
                cv_core::FeatureMatch(camera_a.bearing(points_a[a]), camera_b.bearing(points_b[b]))
            })
            .collect();

        let mut consensus = Arrsac::new(threshold, Pcg64::seed_from_u64(self.seed));
        match consensus.model_inliers(&self.estimator, bearings.iter().copied()) {
            Some((_, inliers)) => {
                debug!("{} of {} matches are inliers", inliers.len(), matches.len());
                inliers.into_iter().map(|ix| matches[ix]).collect()
            }
            None => {
                debug!("no relative pose found for {} matches", matches.len());
                vec![]
            }
        }
    }
}
