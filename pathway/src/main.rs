use log::*;
use pathway_data::DataSet;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pathway",
    about = "Builds matching workloads and navigation graphs for image datasets"
)]
enum Opt {
    /// Matches the features of every image against its candidate images.
    ///
    /// Candidates are chosen by GPS distance and capture order.
    MatchFeatures {
        /// The dataset directory.
        #[structopt(parse(from_os_str))]
        dataset: PathBuf,
    },
    /// Connects the shots of every reconstruction by the motions between them.
    CreateNavigationGraph {
        /// The dataset directory.
        #[structopt(parse(from_os_str))]
        dataset: PathBuf,
    },
}

fn main() {
    pretty_env_logger::init_timed();
    let result = match Opt::from_args() {
        Opt::MatchFeatures { dataset } => {
            pathway::match_features(&DataSet::new(dataset)).map(|_| ())
        }
        Opt::CreateNavigationGraph { dataset } => {
            pathway::create_navigation_graph(&DataSet::new(dataset)).map(|_| ())
        }
    };
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
