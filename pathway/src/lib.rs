//! The stages of the pipeline, each run against a dataset directory.

use log::*;
use pathway_data::{DataError, DataSet};
use pathway_match::{DescriptorMatcher, MatchError, MatchOrchestrator, MatchingReport};
use pathway_nav::{NavigationError, NavigationGraph, NavigationGraphBuilder};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("matching failed for images {}", .0.join(", "))]
    IncompleteMatching(Vec<String>),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Matches every image against its candidates and saves the matches.
///
/// The images whose matching failed are reported as an error once all the others
/// were matched and saved.
pub fn match_features(dataset: &DataSet) -> Result<MatchingReport> {
    let config = dataset.load_config()?;
    let images = dataset.load_image_metadata()?;
    let cameras = dataset.load_camera_models()?;
    info!("matching {} images", images.len());

    let orchestrator = MatchOrchestrator::new(DescriptorMatcher::default(), config.matching);
    let report = orchestrator.run(dataset, &images, &cameras)?;
    dataset.append_profile("matching", report.duration)?;
    if !report.is_complete() {
        return Err(CommandError::IncompleteMatching(
            report.failures.keys().cloned().collect(),
        ));
    }
    Ok(report)
}

/// Builds and saves the navigation graph of every reconstruction.
pub fn create_navigation_graph(dataset: &DataSet) -> Result<Vec<NavigationGraph>> {
    let start = Instant::now();
    let config = dataset.load_config()?;
    let builder = NavigationGraphBuilder::new(config.navigation.validate());
    let reconstructions = dataset.load_reconstructions()?;
    info!(
        "building navigation graphs of {} reconstructions",
        reconstructions.len()
    );

    let graphs = builder.build_all(&reconstructions)?;
    let records: Vec<_> = graphs.iter().map(NavigationGraph::to_record).collect();
    dataset.save_navigation_graphs(&records)?;
    dataset.append_profile("navigation_graph", start.elapsed())?;
    Ok(graphs)
}
