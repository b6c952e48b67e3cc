use log::*;
use serde::{Deserialize, Serialize};

/// The options of navigation graph construction.
///
/// Distances are in reconstruction units and angles in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationSettings {
    /// Shots closer than this are considered to be at the same place
    #[serde(default = "default_nav_min_distance")]
    pub nav_min_distance: f64,
    /// The preferred length of a step
    #[serde(default = "default_nav_step_pref_distance")]
    pub nav_step_pref_distance: f64,
    #[serde(default = "default_nav_step_max_distance")]
    pub nav_step_max_distance: f64,
    #[serde(default = "default_nav_turn_max_distance")]
    pub nav_turn_max_distance: f64,
    /// The maximum change of viewing direction while stepping forward
    #[serde(default = "default_nav_step_forward_view_threshold")]
    pub nav_step_forward_view_threshold: f64,
    /// The maximum change of viewing direction for the other steps
    #[serde(default = "default_nav_step_view_threshold")]
    pub nav_step_view_threshold: f64,
    /// The maximum deviation of the motion from the direction of a step
    #[serde(default = "default_nav_step_drift_threshold")]
    pub nav_step_drift_threshold: f64,
    /// The maximum deviation of the viewing direction change from the one of a turn
    #[serde(default = "default_nav_turn_view_threshold")]
    pub nav_turn_view_threshold: f64,
    /// The maximum vertical angle of the motion and of the viewing direction change
    #[serde(default = "default_nav_vertical_threshold")]
    pub nav_vertical_threshold: f64,
    /// The maximum rotation between two shots connected by a step
    #[serde(default = "default_nav_rotation_threshold")]
    pub nav_rotation_threshold: f64,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            nav_min_distance: default_nav_min_distance(),
            nav_step_pref_distance: default_nav_step_pref_distance(),
            nav_step_max_distance: default_nav_step_max_distance(),
            nav_turn_max_distance: default_nav_turn_max_distance(),
            nav_step_forward_view_threshold: default_nav_step_forward_view_threshold(),
            nav_step_view_threshold: default_nav_step_view_threshold(),
            nav_step_drift_threshold: default_nav_step_drift_threshold(),
            nav_turn_view_threshold: default_nav_turn_view_threshold(),
            nav_vertical_threshold: default_nav_vertical_threshold(),
            nav_rotation_threshold: default_nav_rotation_threshold(),
        }
    }
}

fn default_nav_min_distance() -> f64 {
    0.01
}

fn default_nav_step_pref_distance() -> f64 {
    6.0
}

fn default_nav_step_max_distance() -> f64 {
    20.0
}

fn default_nav_turn_max_distance() -> f64 {
    15.0
}

fn default_nav_step_forward_view_threshold() -> f64 {
    15.0
}

fn default_nav_step_view_threshold() -> f64 {
    30.0
}

fn default_nav_step_drift_threshold() -> f64 {
    36.0
}

fn default_nav_turn_view_threshold() -> f64 {
    40.0
}

fn default_nav_vertical_threshold() -> f64 {
    20.0
}

fn default_nav_rotation_threshold() -> f64 {
    30.0
}

/// Converts an angular option to radians, clamping it at `cap` degrees.
fn clamped_radians(option: &str, degrees: f64, cap: f64) -> f64 {
    if degrees > cap {
        warn!(
            "{} is {} degrees, clamping it to {} degrees",
            option, degrees, cap
        );
        cap.to_radians()
    } else {
        degrees.to_radians()
    }
}

impl NavigationSettings {
    /// Produces the thresholds used by the graph builder.
    ///
    /// Angular options above their hard cap are clamped so that a misconfiguration
    /// cannot connect everything to everything.
    pub fn validate(&self) -> NavigationThresholds {
        NavigationThresholds {
            min_distance: self.nav_min_distance,
            step_pref_distance: self.nav_step_pref_distance,
            step_max_distance: self.nav_step_max_distance,
            turn_max_distance: self.nav_turn_max_distance,
            step_forward_view: clamped_radians(
                "nav_step_forward_view_threshold",
                self.nav_step_forward_view_threshold,
                45.0,
            ),
            step_view: clamped_radians(
                "nav_step_view_threshold",
                self.nav_step_view_threshold,
                45.0,
            ),
            step_drift: clamped_radians(
                "nav_step_drift_threshold",
                self.nav_step_drift_threshold,
                90.0,
            ),
            turn_view: clamped_radians(
                "nav_turn_view_threshold",
                self.nav_turn_view_threshold,
                45.0,
            ),
            vertical: clamped_radians(
                "nav_vertical_threshold",
                self.nav_vertical_threshold,
                90.0,
            ),
            rotation: clamped_radians(
                "nav_rotation_threshold",
                self.nav_rotation_threshold,
                45.0,
            ),
        }
    }
}

/// Validated navigation thresholds with angles in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NavigationThresholds {
    pub min_distance: f64,
    pub step_pref_distance: f64,
    pub step_max_distance: f64,
    pub turn_max_distance: f64,
    pub step_forward_view: f64,
    pub step_view: f64,
    pub step_drift: f64,
    pub turn_view: f64,
    pub vertical: f64,
    pub rotation: f64,
}

impl NavigationThresholds {
    /// The largest distance at which any motion is considered.
    pub fn max_distance(&self) -> f64 {
        self.step_max_distance.max(self.turn_max_distance)
    }
}

impl Default for NavigationThresholds {
    fn default() -> Self {
        NavigationSettings::default().validate()
    }
}
