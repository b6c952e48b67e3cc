use serde::{Deserialize, Serialize};

/// The settings of a matching run.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// The maximum GPS distance in meters between two images for them to be matched
    #[serde(default = "default_matching_gps_distance")]
    pub matching_gps_distance: f64,
    /// The number of nearest images by GPS distance to match against (0 for all)
    #[serde(default = "default_matching_gps_neighbors")]
    pub matching_gps_neighbors: usize,
    /// The number of images before and after in name order to match against, regardless of GPS
    #[serde(default = "default_matching_order_neighbors")]
    pub matching_order_neighbors: usize,
    /// The minimum number of preemptive matches to continue matching a pair (0 disables the stage)
    #[serde(default = "default_preemptive_threshold")]
    pub preemptive_threshold: usize,
    /// The ratio test threshold of the preemptive stage
    #[serde(default = "default_preemptive_lowes_ratio")]
    pub preemptive_lowes_ratio: f64,
    /// The number of features used by the preemptive stage
    #[serde(default = "default_preemptive_max")]
    pub preemptive_max: usize,
    /// The ratio test threshold of the symmetric stage
    #[serde(default = "default_lowes_ratio")]
    pub lowes_ratio: f64,
    /// The minimum number of matches after the symmetric and robust stages to accept a pair
    #[serde(default = "default_robust_matching_min_match")]
    pub robust_matching_min_match: usize,
    /// The maximum angular distance in radians from the epipolar plane for a robust inlier
    #[serde(default = "default_robust_matching_threshold")]
    pub robust_matching_threshold: f64,
    /// The number of images matched concurrently
    #[serde(default = "default_processes")]
    pub processes: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            matching_gps_distance: default_matching_gps_distance(),
            matching_gps_neighbors: default_matching_gps_neighbors(),
            matching_order_neighbors: default_matching_order_neighbors(),
            preemptive_threshold: default_preemptive_threshold(),
            preemptive_lowes_ratio: default_preemptive_lowes_ratio(),
            preemptive_max: default_preemptive_max(),
            lowes_ratio: default_lowes_ratio(),
            robust_matching_min_match: default_robust_matching_min_match(),
            robust_matching_threshold: default_robust_matching_threshold(),
            processes: default_processes(),
        }
    }
}

fn default_matching_gps_distance() -> f64 {
    9_999_999.0
}

fn default_matching_gps_neighbors() -> usize {
    0
}

fn default_matching_order_neighbors() -> usize {
    0
}

fn default_preemptive_threshold() -> usize {
    0
}

fn default_preemptive_lowes_ratio() -> f64 {
    0.6
}

fn default_preemptive_max() -> usize {
    200
}

fn default_lowes_ratio() -> f64 {
    0.8
}

fn default_robust_matching_min_match() -> usize {
    20
}

fn default_robust_matching_threshold() -> f64 {
    0.004
}

fn default_processes() -> usize {
    1
}
