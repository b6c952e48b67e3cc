use crate::{
    Direction, NavigationEdge, NavigationError, NavigationGraph, NavigationThresholds, Result,
    Strategy,
};
use core::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use log::*;
use pathway_core::nalgebra::{Point3, Rotation3, Vector3};
use pathway_core::Reconstruction;
use pathway_geom::{
    angular_difference, planar_angle_between, rotation_angle_between, vertical_angle,
    DegenerateVectorError,
};

/// The quantities of a shot used to compare it with the others.
struct Shot<'a> {
    id: &'a str,
    center: Point3<f64>,
    direction: Vector3<f64>,
    rotation: Rotation3<f64>,
}

/// The geometry of moving from one shot to another.
#[derive(Debug, Clone, Copy)]
struct Transition<'a> {
    target: &'a str,
    distance: f64,
    /// The direction of motion relative to the viewing direction of the source.
    motion_angle: f64,
    /// The change of viewing direction in the ground plane.
    view_turn: f64,
    motion_vertical: f64,
    view_vertical: f64,
    rotation: f64,
}

/// The nominal geometry of a motion.
enum Motion {
    Step { motion: f64 },
    Turn { view: f64, motion: Option<f64> },
}

fn motion(direction: Direction) -> Motion {
    match direction {
        Direction::StepForward => Motion::Step { motion: 0.0 },
        Direction::StepBackward => Motion::Step { motion: PI },
        Direction::StepLeft => Motion::Step { motion: -FRAC_PI_2 },
        Direction::StepRight => Motion::Step { motion: FRAC_PI_2 },
        Direction::TurnLeft => Motion::Turn {
            view: -FRAC_PI_2,
            motion: Some(-FRAC_PI_4),
        },
        Direction::TurnRight => Motion::Turn {
            view: FRAC_PI_2,
            motion: Some(FRAC_PI_4),
        },
        Direction::TurnU => Motion::Turn {
            view: PI,
            motion: None,
        },
    }
}

/// The best candidate found so far under one strategy.
#[derive(Clone, Copy)]
struct Best<'a> {
    penalty: f64,
    transition: Transition<'a>,
}

fn keep_lowest<'a>(best: &mut Option<Best<'a>>, penalty: f64, transition: Transition<'a>) {
    if best.map_or(true, |best| penalty < best.penalty) {
        *best = Some(Best {
            penalty,
            transition,
        });
    }
}

/// Connects the shots of reconstructions by the motions a viewer can make between them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationGraphBuilder {
    pub thresholds: NavigationThresholds,
}

impl NavigationGraphBuilder {
    pub fn new(thresholds: NavigationThresholds) -> Self {
        Self { thresholds }
    }

    /// Builds one graph per reconstruction, in order.
    pub fn build_all(&self, reconstructions: &[Reconstruction]) -> Result<Vec<NavigationGraph>> {
        reconstructions
            .iter()
            .map(|reconstruction| self.build(reconstruction))
            .collect()
    }

    pub fn build(&self, reconstruction: &Reconstruction) -> Result<NavigationGraph> {
        let shots: Vec<Shot> = reconstruction
            .shots
            .iter()
            .map(|(id, pose)| Shot {
                id: id.as_str(),
                center: pose.optical_center(),
                direction: pose.viewing_direction(),
                rotation: pose.rotation(),
            })
            .collect();

        let mut graph = NavigationGraph {
            nodes: reconstruction.shots.keys().cloned().collect(),
            edges: vec![],
        };
        for source in &shots {
            let transitions = self.transitions(source, &shots)?;
            for direction in Direction::ALL {
                self.connect(&mut graph, source.id, direction, &transitions);
            }
        }
        info!(
            "built navigation graph with {} nodes and {} edges",
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    /// Computes the transitions from `source` to every shot within reach.
    fn transitions<'a>(
        &self,
        source: &Shot<'a>,
        shots: &[Shot<'a>],
    ) -> Result<Vec<Transition<'a>>> {
        let thresholds = &self.thresholds;
        let source_vertical = vertical_angle(&source.direction)
            .map_err(|e| NavigationError::degenerate(source.id, source.id, e))?;

        let mut transitions = vec![];
        for target in shots {
            if target.id == source.id {
                continue;
            }
            let motion = target.center - source.center;
            let distance = motion.norm();
            if distance == 0.0
                || distance < thresholds.min_distance
                || distance > thresholds.max_distance()
            {
                continue;
            }
            let degenerate = |e: DegenerateVectorError| NavigationError::degenerate(source.id, target.id, e);
            let motion_vertical = vertical_angle(&motion).map_err(degenerate)?;
            let target_vertical = vertical_angle(&target.direction).map_err(degenerate)?;
            transitions.push(Transition {
                target: target.id,
                distance,
                motion_angle: planar_angle_between(&source.direction.xy(), &motion.xy()),
                view_turn: planar_angle_between(&source.direction.xy(), &target.direction.xy()),
                motion_vertical: motion_vertical.abs(),
                view_vertical: (target_vertical - source_vertical).abs(),
                rotation: rotation_angle_between(&source.rotation, &target.rotation),
            });
        }
        Ok(transitions)
    }

    /// Returns the combined angular deviation of a transition from the nominal
    /// motion of `direction`, or `None` if it does not qualify.
    fn deviation(&self, direction: Direction, t: &Transition) -> Option<f64> {
        let thresholds = &self.thresholds;
        if t.motion_vertical >= thresholds.vertical || t.view_vertical >= thresholds.vertical {
            return None;
        }
        match motion(direction) {
            Motion::Step { motion } => {
                let drift_tolerance = match direction {
                    Direction::StepForward | Direction::StepBackward => thresholds.step_drift,
                    _ => (FRAC_PI_2 - thresholds.step_drift).min(FRAC_PI_4),
                };
                let view_limit = match direction {
                    Direction::StepForward => thresholds.step_forward_view,
                    _ => thresholds.step_view,
                };
                // The motion is also measured against the viewing direction of the target.
                let against_target = angular_difference(t.motion_angle, t.view_turn);
                let drift = angular_difference(t.motion_angle, motion)
                    .abs()
                    .max(angular_difference(against_target, motion).abs());
                let qualifies = t.distance < thresholds.step_max_distance
                    && drift < drift_tolerance
                    && t.view_turn.abs() < view_limit
                    && t.rotation < thresholds.rotation;
                qualifies.then(|| drift + t.motion_vertical)
            }
            Motion::Turn { view, motion } => {
                let view_deviation = angular_difference(t.view_turn, view).abs();
                let motion_deviation =
                    motion.map_or(0.0, |motion| angular_difference(t.motion_angle, motion).abs());
                let qualifies = t.distance < thresholds.turn_max_distance
                    && view_deviation < thresholds.turn_view
                    && motion_deviation < thresholds.turn_view;
                qualifies.then(|| view_deviation + motion_deviation)
            }
        }
    }

    /// Adds the best edge of `direction` under each strategy.
    fn connect(
        &self,
        graph: &mut NavigationGraph,
        source: &str,
        direction: Direction,
        transitions: &[Transition],
    ) {
        let thresholds = &self.thresholds;
        let mut preferred = None;
        let mut nearest = None;
        for transition in transitions {
            if let Some(deviation) = self.deviation(direction, transition) {
                let angular = 16.0 * transition.rotation + 8.0 * deviation;
                let preference =
                    (transition.distance - thresholds.step_pref_distance).abs() + angular;
                keep_lowest(&mut preferred, preference, *transition);
                keep_lowest(&mut nearest, transition.distance + angular, *transition);
            }
        }

        for (strategy, best) in [
            (Strategy::Preference, preferred),
            (Strategy::Position, nearest),
        ] {
            if let Some(Best { transition, .. }) = best {
                trace!(
                    "{} -> {}: {} ({:?})",
                    source,
                    transition.target,
                    direction,
                    strategy
                );
                graph.edges.push(NavigationEdge {
                    source: source.to_owned(),
                    target: transition.target.to_owned(),
                    direction,
                    strategy,
                    weight: transition.distance,
                });
            }
        }
    }
}
