use crate::{
    CandidateSelector, CandidateSet, FeatureIndex, GeometricMatcher, MatchError,
    MatchingSettings, Result,
};
use log::*;
use pathway_core::{CameraModel, FeatureMatch, Features, ImageMetadata, MatchMap};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::iter::once;
use std::time::{Duration, Instant};

/// Loads the features of images.
pub trait FeatureStore: Sync {
    fn load_features(&self, image: &str) -> Result<Features>;

    /// Loads the reduced feature set used by preemptive matching.
    ///
    /// Returns `None` when no such set was stored for the image.
    fn load_preemptive_features(&self, image: &str) -> Result<Option<Features>>;

    fn load_feature_index(&self, _image: &str, features: &Features) -> Result<FeatureIndex> {
        Ok(FeatureIndex::new(&features.descriptors))
    }
}

/// Persists the matches of each image.
pub trait MatchStore: Sync {
    fn save_matches(&self, image: &str, matches: &MatchMap) -> Result<()>;
}

/// The features of an image together with their search index.
#[derive(Debug, Clone)]
pub struct IndexedFeatures {
    pub features: Features,
    pub index: FeatureIndex,
}

/// Read-only data shared by every unit of a matching run.
///
/// This is fully built before any unit is dispatched and is never mutated afterwards.
#[derive(Debug, Default)]
pub struct MatchingContext {
    metadata: BTreeMap<String, ImageMetadata>,
    cameras: BTreeMap<String, CameraModel>,
    features: BTreeMap<String, IndexedFeatures>,
    preemptive: BTreeMap<String, Features>,
    /// Why the features of an image could not be loaded.
    load_errors: BTreeMap<String, String>,
}

impl MatchingContext {
    /// Loads everything the candidate pairs will need.
    ///
    /// Images whose features cannot be loaded are left out and fail their units later with
    /// the load error. Features must have as many points as descriptors.
    pub fn build<S: FeatureStore>(
        store: &S,
        images: &BTreeMap<String, ImageMetadata>,
        cameras: &BTreeMap<String, CameraModel>,
        candidates: &CandidateSet,
        settings: &MatchingSettings,
    ) -> Self {
        let involved: BTreeSet<&String> = candidates
            .iter()
            .filter(|(_, partners)| !partners.is_empty())
            .flat_map(|(image, partners)| once(image).chain(partners))
            .collect();
        info!("loading features of {} images", involved.len());

        let mut context = Self {
            metadata: images.clone(),
            ..Default::default()
        };
        for &image in &involved {
            if let Some(metadata) = images.get(image) {
                // The projection type recorded for the image wins over the camera table.
                if let Some(camera) = cameras.get(&metadata.camera) {
                    let camera = camera.with_projection_type(metadata.projection_type);
                    context.cameras.insert(image.clone(), camera);
                }
            }

            let indexed = store.load_features(image).and_then(|features| {
                if features.points.len() != features.descriptors.len() {
                    return Err(MatchError::InconsistentFeatures {
                        image: image.clone(),
                        points: features.points.len(),
                        descriptors: features.descriptors.len(),
                    });
                }
                let index = store.load_feature_index(image, &features)?;
                Ok(IndexedFeatures { features, index })
            });
            match indexed {
                Ok(indexed) => {
                    context.features.insert(image.clone(), indexed);
                }
                Err(e) => {
                    warn!("unable to load features of {}: {}", image, e);
                    context.load_errors.insert(image.clone(), e.to_string());
                }
            }
        }

        if settings.preemptive_threshold > 0 {
            for &image in &involved {
                let preemptive = match store.load_preemptive_features(image) {
                    Ok(Some(features)) => Some(features),
                    Ok(None) => {
                        debug!("no preemptive features for {}, using full features", image);
                        context.features.get(image).map(|f| f.features.clone())
                    }
                    Err(e) => {
                        warn!(
                            "unable to load preemptive features of {}, using full features: {}",
                            image, e
                        );
                        context.features.get(image).map(|f| f.features.clone())
                    }
                };
                if let Some(preemptive) = preemptive {
                    context.preemptive.insert(
                        image.clone(),
                        preemptive.truncated(settings.preemptive_max),
                    );
                }
            }
        }
        context
    }

    pub fn features(&self, image: &str) -> Result<&IndexedFeatures> {
        self.features
            .get(image)
            .ok_or_else(|| match self.load_errors.get(image) {
                Some(message) => MatchError::FeatureLoad {
                    image: image.to_owned(),
                    message: message.clone(),
                },
                None => MatchError::MissingFeatures(image.to_owned()),
            })
    }

    pub fn preemptive_features(&self, image: &str) -> Result<&Features> {
        self.preemptive
            .get(image)
            .ok_or_else(|| MatchError::MissingFeatures(image.to_owned()))
    }

    pub fn camera(&self, image: &str) -> Result<&CameraModel> {
        self.cameras.get(image).ok_or_else(|| match self.metadata.get(image) {
            Some(metadata) => MatchError::MissingCamera {
                image: image.to_owned(),
                camera: metadata.camera.clone(),
            },
            None => MatchError::MissingMetadata(image.to_owned()),
        })
    }
}

/// The outcome of a matching run.
#[derive(Debug, Clone, Default)]
pub struct MatchingReport {
    pub candidates: CandidateSet,
    /// The number of accepted partners of each image whose unit succeeded.
    pub accepted: BTreeMap<String, usize>,
    /// The error of each image whose unit failed.
    pub failures: BTreeMap<String, String>,
    pub duration: Duration,
}

impl MatchingReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the staged matching of candidate pairs.
#[derive(Debug, Clone)]
pub struct MatchOrchestrator<M> {
    pub matcher: M,
    pub settings: MatchingSettings,
}

impl<M> MatchOrchestrator<M>
where
    M: GeometricMatcher,
{
    pub fn new(matcher: M, settings: MatchingSettings) -> Self {
        Self { matcher, settings }
    }

    /// Matches one pair, returning an empty list as soon as a stage rejects it.
    pub fn match_pair(
        &self,
        context: &MatchingContext,
        a: &str,
        b: &str,
    ) -> Result<Vec<FeatureMatch>> {
        let settings = &self.settings;
        let (features_a, features_b) = (context.features(a)?, context.features(b)?);
        let (camera_a, camera_b) = (context.camera(a)?, context.camera(b)?);

        if settings.preemptive_threshold > 0 {
            let preemptive = self.matcher.match_lowe(
                &context.preemptive_features(a)?.descriptors,
                &context.preemptive_features(b)?.descriptors,
                settings.preemptive_lowes_ratio,
            );
            if preemptive.len() < settings.preemptive_threshold {
                debug!(
                    "{} - {}: rejected with {} preemptive matches",
                    a,
                    b,
                    preemptive.len()
                );
                return Ok(vec![]);
            }
        }

        let symmetric = self.matcher.match_symmetric(
            &features_a.index,
            &features_b.index,
            settings.lowes_ratio,
        );
        if symmetric.len() < settings.robust_matching_min_match {
            debug!(
                "{} - {}: rejected with {} symmetric matches",
                a,
                b,
                symmetric.len()
            );
            return Ok(vec![]);
        }

        let robust = self.matcher.robust_match(
            &features_a.features.points,
            &features_b.features.points,
            camera_a,
            camera_b,
            &symmetric,
            settings.robust_matching_threshold,
        );
        if robust.len() < settings.robust_matching_min_match {
            debug!(
                "{} - {}: rejected with {} robust matches",
                a,
                b,
                robust.len()
            );
            return Ok(vec![]);
        }

        debug!(
            "{} - {}: {} symmetric, {} robust matches",
            a,
            b,
            symmetric.len(),
            robust.len()
        );
        Ok(robust)
    }

    /// Matches an image against all of its candidates.
    ///
    /// Any error fails the whole unit, discarding the pairs already matched.
    pub fn match_unit(
        &self,
        context: &MatchingContext,
        image: &str,
        partners: &[String],
    ) -> Result<MatchMap> {
        partners
            .iter()
            .map(|partner| Ok((partner.clone(), self.match_pair(context, image, partner)?)))
            .collect()
    }

    /// Selects candidates, matches them and saves the matches of every image.
    pub fn run<S>(
        &self,
        store: &S,
        images: &BTreeMap<String, ImageMetadata>,
        cameras: &BTreeMap<String, CameraModel>,
    ) -> Result<MatchingReport>
    where
        S: FeatureStore + MatchStore,
    {
        let start = Instant::now();
        let candidates = CandidateSelector::from(&self.settings).select(images);
        let context = MatchingContext::build(store, images, cameras, &candidates, &self.settings);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.processes.max(1))
            .thread_name(|ix| format!("matching-{}", ix))
            .build()?;

        let units: Vec<(&String, &Vec<String>)> = candidates.iter().collect();
        let total = units.len();
        let outcomes: Vec<(String, Result<usize>)> = pool.install(|| {
            units
                .par_iter()
                .enumerate()
                .map(|(ix, &(image, partners))| {
                    info!("matching image {} of {}: {}", ix + 1, total, image);
                    let outcome = self
                        .match_unit(&context, image, partners)
                        .and_then(|matches| {
                            store.save_matches(image, &matches)?;
                            Ok(matches.values().filter(|m| !m.is_empty()).count())
                        });
                    (image.clone(), outcome)
                })
                .collect()
        });

        let mut report = MatchingReport {
            candidates,
            ..Default::default()
        };
        for (image, outcome) in outcomes {
            match outcome {
                Ok(accepted) => {
                    report.accepted.insert(image, accepted);
                }
                Err(e) => {
                    error!("matching failed for {}: {}", image, e);
                    report.failures.insert(image, e.to_string());
                }
            }
        }
        report.duration = start.elapsed();
        info!(
            "matched {} images in {:.3}s with {} failures",
            report.accepted.len(),
            report.duration.as_secs_f64(),
            report.failures.len()
        );
        Ok(report)
    }
}
