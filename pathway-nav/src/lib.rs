//! Builds navigation graphs over the shots of a reconstruction.
//!
//! Every ordered pair of shots within reach is classified into the motions a viewer
//! would make to go from one to the other: stepping forward, backward, left or right
//! while looking roughly the same way, or turning left, right or around. For every
//! shot and motion at most two edges are kept:
//!
//! * [`Strategy::Preference`]: the shot whose distance is closest to the preferred
//!   step length
//! * [`Strategy::Position`]: the nearest shot
//!
//! Both rankings penalize rotation and angular deviation from the nominal motion with
//! the same fixed weights. Graphs are rebuilt from scratch from the poses each time.

mod builder;
mod graph;
mod settings;

pub use builder::*;
pub use graph::*;
pub use settings::*;

use pathway_geom::DegenerateVectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("degenerate geometry between shots {source_shot} and {target_shot}: {error}")]
    Degenerate {
        source_shot: String,
        target_shot: String,
        #[source]
        error: DegenerateVectorError,
    },
}

impl NavigationError {
    fn degenerate(source: &str, target: &str, error: DegenerateVectorError) -> Self {
        Self::Degenerate {
            source_shot: source.to_owned(),
            target_shot: target.to_owned(),
            error,
        }
    }
}

pub type Result<T> = std::result::Result<T, NavigationError>;
