use crate::{Config, DataError, Result};
use log::*;
use pathway_core::{CameraModel, Features, ImageMetadata, MatchMap, Reconstruction};
use pathway_match::{FeatureStore, MatchError, MatchStore};
use pathway_nav::GraphRecord;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DataError + '_ {
    move |source| DataError::Io {
        path: path.to_owned(),
        source,
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(io_error(path))
}

/// Creates `path` along with its parent directories.
fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    File::create(path).map(BufWriter::new).map_err(io_error(path))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    serde_json::from_reader(open(path)?).map_err(|source| DataError::Json {
        path: path.to_owned(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut file = create(path)?;
    serde_json::to_writer(&mut file, value).map_err(|source| DataError::Json {
        path: path.to_owned(),
        source,
    })?;
    file.flush().map_err(io_error(path))
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    bincode::deserialize_from(open(path)?).map_err(|source| DataError::Bincode {
        path: path.to_owned(),
        source,
    })
}

fn write_bincode<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut file = create(path)?;
    bincode::serialize_into(&mut file, value).map_err(|source| DataError::Bincode {
        path: path.to_owned(),
        source,
    })?;
    file.flush().map_err(io_error(path))
}

/// A dataset directory.
#[derive(Debug, Clone)]
pub struct DataSet {
    root: PathBuf,
}

impl DataSet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn exif_path(&self, image: &str) -> PathBuf {
        self.root.join("exif").join(format!("{}.json", image))
    }

    fn features_path(&self, image: &str) -> PathBuf {
        self.root.join("features").join(format!("{}.bin", image))
    }

    fn preemptive_path(&self, image: &str) -> PathBuf {
        self.root.join("preemptive").join(format!("{}.bin", image))
    }

    fn matches_path(&self, image: &str) -> PathBuf {
        self.root.join("matches").join(format!("{}.bin", image))
    }

    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.root.join("config.json"))
    }

    /// The images of the dataset, in name order.
    pub fn images(&self) -> Result<Vec<String>> {
        let dir = self.root.join("exif");
        let mut images = vec![];
        for entry in fs::read_dir(&dir).map_err(io_error(&dir))? {
            let path = entry.map_err(io_error(&dir))?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    images.push(stem.to_owned());
                }
            }
        }
        images.sort();
        Ok(images)
    }

    pub fn load_exif(&self, image: &str) -> Result<ImageMetadata> {
        read_json(&self.exif_path(image))
    }

    pub fn save_exif(&self, image: &str, metadata: &ImageMetadata) -> Result<()> {
        write_json(&self.exif_path(image), metadata)
    }

    /// Loads the metadata of every image.
    pub fn load_image_metadata(&self) -> Result<BTreeMap<String, ImageMetadata>> {
        self.images()?
            .into_iter()
            .map(|image| {
                let metadata = self.load_exif(&image)?;
                Ok((image, metadata))
            })
            .collect()
    }

    pub fn load_camera_models(&self) -> Result<BTreeMap<String, CameraModel>> {
        read_json(&self.root.join("camera_models.json"))
    }

    pub fn save_camera_models(&self, cameras: &BTreeMap<String, CameraModel>) -> Result<()> {
        write_json(&self.root.join("camera_models.json"), cameras)
    }

    pub fn load_features(&self, image: &str) -> Result<Features> {
        read_bincode(&self.features_path(image))
    }

    pub fn save_features(&self, image: &str, features: &Features) -> Result<()> {
        write_bincode(&self.features_path(image), features)
    }

    /// Loads the reduced features of an image, or `None` if none were saved.
    pub fn load_preemptive_features(&self, image: &str) -> Result<Option<Features>> {
        match read_bincode(&self.preemptive_path(image)) {
            Ok(features) => Ok(Some(features)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn save_preemptive_features(&self, image: &str, features: &Features) -> Result<()> {
        write_bincode(&self.preemptive_path(image), features)
    }

    pub fn load_matches(&self, image: &str) -> Result<MatchMap> {
        read_bincode(&self.matches_path(image))
    }

    pub fn save_matches(&self, image: &str, matches: &MatchMap) -> Result<()> {
        write_bincode(&self.matches_path(image), matches)
    }

    pub fn load_reconstructions(&self) -> Result<Vec<Reconstruction>> {
        read_json(&self.root.join("reconstruction.json"))
    }

    pub fn save_reconstructions(&self, reconstructions: &[Reconstruction]) -> Result<()> {
        write_json(&self.root.join("reconstruction.json"), reconstructions)
    }

    pub fn load_navigation_graphs(&self) -> Result<Vec<GraphRecord>> {
        read_json(&self.root.join("navigation_graph.json"))
    }

    pub fn save_navigation_graphs(&self, graphs: &[GraphRecord]) -> Result<()> {
        write_json(&self.root.join("navigation_graph.json"), graphs)
    }

    /// Appends the duration of a stage to the profiling log.
    pub fn append_profile(&self, stage: &str, duration: Duration) -> Result<()> {
        let path = self.root.join("profile.log");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;
        writeln!(file, "{}: {}", stage, duration.as_secs_f64()).map_err(io_error(&path))?;
        debug!("{} took {:.3}s", stage, duration.as_secs_f64());
        Ok(())
    }
}

impl FeatureStore for DataSet {
    fn load_features(&self, image: &str) -> pathway_match::Result<Features> {
        DataSet::load_features(self, image).map_err(MatchError::storage)
    }

    fn load_preemptive_features(&self, image: &str) -> pathway_match::Result<Option<Features>> {
        DataSet::load_preemptive_features(self, image).map_err(MatchError::storage)
    }
}

impl MatchStore for DataSet {
    fn save_matches(&self, image: &str, matches: &MatchMap) -> pathway_match::Result<()> {
        DataSet::save_matches(self, image, matches).map_err(MatchError::storage)
    }
}
