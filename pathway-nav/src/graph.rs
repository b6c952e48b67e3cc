use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The motion that takes a viewer from one shot to another.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    StepForward,
    StepBackward,
    StepLeft,
    StepRight,
    TurnLeft,
    TurnRight,
    TurnU,
}

impl Direction {
    /// Every direction, steps first.
    pub const ALL: [Direction; 7] = [
        Direction::StepForward,
        Direction::StepBackward,
        Direction::StepLeft,
        Direction::StepRight,
        Direction::TurnLeft,
        Direction::TurnRight,
        Direction::TurnU,
    ];

    pub fn is_step(self) -> bool {
        matches!(
            self,
            Direction::StepForward
                | Direction::StepBackward
                | Direction::StepLeft
                | Direction::StepRight
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::StepForward => "step_forward",
            Direction::StepBackward => "step_backward",
            Direction::StepLeft => "step_left",
            Direction::StepRight => "step_right",
            Direction::TurnLeft => "turn_left",
            Direction::TurnRight => "turn_right",
            Direction::TurnU => "turn_u",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the target of an edge was chosen among the qualifying shots.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// The shot closest to the preferred step distance.
    #[serde(rename = "pref")]
    Preference,
    /// The nearest shot.
    #[serde(rename = "pos")]
    Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub source: String,
    pub target: String,
    pub direction: Direction,
    pub strategy: Strategy,
    /// The distance between the optical centers of the two shots.
    pub weight: f64,
}

/// A directed multigraph over the shots of one reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationGraph {
    pub nodes: BTreeSet<String>,
    pub edges: Vec<NavigationEdge>,
}

impl NavigationGraph {
    pub fn edges_from<'a, 'b>(
        &'a self,
        source: &'b str,
    ) -> impl Iterator<Item = &'a NavigationEdge> + use<'a, 'b> {
        self.edges.iter().filter(move |edge| edge.source == source)
    }

    /// Finds the edge leaving `source` in `direction` chosen by `strategy`.
    pub fn edge(
        &self,
        source: &str,
        direction: Direction,
        strategy: Strategy,
    ) -> Option<&NavigationEdge> {
        self.edges_from(source)
            .find(|edge| edge.direction == direction && edge.strategy == strategy)
    }

    /// Converts the graph into its persisted form.
    ///
    /// The persisted form keys edges by target, so when two directions chose the same
    /// target under the same strategy only the first direction is kept.
    pub fn to_record(&self) -> GraphRecord {
        let mut edges: BTreeMap<String, EdgeRecords> = BTreeMap::new();
        for edge in &self.edges {
            let records = edges.entry(edge.source.clone()).or_default();
            let by_target = match edge.strategy {
                Strategy::Preference => &mut records.pref,
                Strategy::Position => &mut records.pos,
            };
            by_target
                .entry(edge.target.clone())
                .or_insert(EdgeRecord {
                    weight: edge.weight,
                    direction: edge.direction,
                });
        }
        GraphRecord {
            nodes: self.nodes.iter().cloned().collect(),
            edges,
        }
    }
}

/// The persisted navigation graph of one reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub nodes: Vec<String>,
    pub edges: BTreeMap<String, EdgeRecords>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecords {
    pub pref: BTreeMap<String, EdgeRecord>,
    pub pos: BTreeMap<String, EdgeRecord>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub weight: f64,
    pub direction: Direction,
}
