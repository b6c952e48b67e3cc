use crate::{DataError, Result};
use log::*;
use pathway_match::MatchingSettings;
use pathway_nav::NavigationSettings;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The options of every stage, read from a single flat JSON object.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub matching: MatchingSettings,
    #[serde(flatten)]
    pub navigation: NavigationSettings,
}

impl Config {
    /// Loads the options from `path`, using the defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no configuration at {}, used default settings", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(DataError::Io {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        let config = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            DataError::Json {
                path: path.to_owned(),
                source,
            }
        })?;
        info!("loaded settings from {}", path.display());
        Ok(config)
    }
}
