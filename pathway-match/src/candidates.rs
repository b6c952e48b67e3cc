use crate::MatchingSettings;
use log::*;
use pathway_core::ImageMetadata;
use std::collections::{BTreeMap, BTreeSet};

/// Maps each image to the images it will be matched against.
///
/// Every image is a key. Each unordered pair appears once, listed under the
/// lexicographically smaller image. A list can therefore be longer than the
/// neighbour cap, which only bounds [`CandidateSelector::nearest`].
pub type CandidateSet = BTreeMap<String, Vec<String>>;

/// An unordered pair of images, stored with the smaller name first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair(String, String);

impl Pair {
    /// Creates a new pair, canonicalizing the order of the pair.
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_owned(), b.to_owned())
        } else {
            Self(b.to_owned(), a.to_owned())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

/// The GPS distance between two images, which is zero if either has no GPS.
pub fn gps_distance(a: &ImageMetadata, b: &ImageMetadata) -> f64 {
    match (&a.gps, &b.gps) {
        (Some(a), Some(b)) => a.distance(b),
        _ => 0.0,
    }
}

/// Selects candidate pairs from image metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateSelector {
    /// Pairs further apart than this many meters are dropped.
    pub max_distance: f64,
    /// Keep only this many nearest images per image (0 keeps all).
    pub max_neighbors: usize,
    /// Also pair each image with this many images on either side in name order.
    pub order_neighbors: usize,
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self {
            max_distance: 9_999_999.0,
            max_neighbors: 0,
            order_neighbors: 0,
        }
    }
}

impl From<&MatchingSettings> for CandidateSelector {
    fn from(settings: &MatchingSettings) -> Self {
        Self {
            max_distance: settings.matching_gps_distance,
            max_neighbors: settings.matching_gps_neighbors,
            order_neighbors: settings.matching_order_neighbors,
        }
    }
}

impl CandidateSelector {
    /// The images each image would like to be matched against based on GPS alone.
    ///
    /// Lists are ordered by increasing distance. Equal distances keep the name order.
    pub fn nearest(&self, images: &BTreeMap<String, ImageMetadata>) -> CandidateSet {
        images
            .iter()
            .map(|(im1, m1)| {
                let mut distances: Vec<(f64, &String)> = images
                    .iter()
                    .filter(|&(im2, _)| im2 != im1)
                    .map(|(im2, m2)| (gps_distance(m1, m2), im2))
                    .filter(|&(distance, _)| distance <= self.max_distance)
                    .collect();
                // Stable, so ties stay in enumeration order.
                distances.sort_by(|a, b| a.0.total_cmp(&b.0));
                if self.max_neighbors > 0 {
                    distances.truncate(self.max_neighbors);
                }
                let nearest = distances.into_iter().map(|(_, im2)| im2.clone()).collect();
                (im1.clone(), nearest)
            })
            .collect()
    }

    /// All the unordered pairs to match.
    pub fn pairs(&self, images: &BTreeMap<String, ImageMetadata>) -> BTreeSet<Pair> {
        let mut pairs: BTreeSet<Pair> = self
            .nearest(images)
            .iter()
            .flat_map(|(im1, nearest)| nearest.iter().map(move |im2| Pair::new(im1, im2)))
            .collect();

        if self.order_neighbors > 0 {
            let names: Vec<&String> = images.keys().collect();
            for (i, im1) in names.iter().enumerate() {
                let end = (i + self.order_neighbors + 1).min(names.len());
                for im2 in &names[i + 1..end] {
                    pairs.insert(Pair::new(im1, im2));
                }
            }
        }
        pairs
    }

    /// The candidate set of the images.
    ///
    /// `max_neighbors` caps the nearest list of every image before the pairs are made
    /// unordered. An image that is near to many others collects all of those pairs and
    /// may end up with more than `max_neighbors` partners.
    pub fn select(&self, images: &BTreeMap<String, ImageMetadata>) -> CandidateSet {
        let pairs = self.pairs(images);
        info!(
            "selected {} candidate pairs among {} images",
            pairs.len(),
            images.len()
        );
        let mut candidates: CandidateSet = images.keys().map(|im| (im.clone(), vec![])).collect();
        for pair in pairs {
            if let Some(partners) = candidates.get_mut(pair.first()) {
                partners.push(pair.second().to_owned());
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(gps: &[(&str, Option<(f64, f64)>)]) -> BTreeMap<String, ImageMetadata> {
        gps.iter()
            .map(|&(name, gps)| {
                let metadata = ImageMetadata::new("camera");
                let metadata = match gps {
                    Some((lat, lon)) => metadata.with_gps(lat, lon),
                    None => metadata,
                };
                (name.to_owned(), metadata)
            })
            .collect()
    }

    #[test]
    fn single_image_has_no_pairs() {
        let images = images(&[("a.jpg", Some((10.0, 10.0)))]);
        let candidates = CandidateSelector::default().select(&images);
        assert_eq!(candidates.len(), 1);
        assert!(candidates["a.jpg"].is_empty());
    }

    #[test]
    fn far_images_are_not_candidates() {
        // About 100 meters apart.
        let images = images(&[("a.jpg", Some((0.0, 0.0))), ("b.jpg", Some((0.0009, 0.0)))]);
        let selector = CandidateSelector {
            max_distance: 50.0,
            ..Default::default()
        };
        let candidates = selector.select(&images);
        assert!(candidates["a.jpg"].is_empty());
        assert!(candidates["b.jpg"].is_empty());

        let selector = CandidateSelector {
            max_distance: 150.0,
            ..Default::default()
        };
        let candidates = selector.select(&images);
        assert_eq!(candidates["a.jpg"], vec!["b.jpg".to_owned()]);
        assert!(candidates["b.jpg"].is_empty());
    }

    #[test]
    fn missing_gps_matches_everything() {
        let images = images(&[
            ("a.jpg", None),
            ("b.jpg", Some((0.0, 0.0))),
            ("c.jpg", Some((10.0, 0.0))),
        ]);
        let selector = CandidateSelector {
            max_distance: 1.0,
            ..Default::default()
        };
        let pairs = selector.pairs(&images);
        assert_eq!(
            pairs.into_iter().collect::<Vec<_>>(),
            vec![Pair::new("a.jpg", "b.jpg"), Pair::new("a.jpg", "c.jpg")]
        );
    }

    #[test]
    fn neighbor_cap_limits_nearest() {
        let images = images(&[
            ("a.jpg", None),
            ("b.jpg", None),
            ("c.jpg", None),
            ("d.jpg", None),
        ]);
        let selector = CandidateSelector {
            max_neighbors: 2,
            ..Default::default()
        };
        let nearest = selector.nearest(&images);
        for list in nearest.values() {
            assert!(list.len() <= 2);
        }
        // All distances tie, so the name order decides.
        assert_eq!(nearest["c.jpg"], vec!["a.jpg".to_owned(), "b.jpg".to_owned()]);
        assert_eq!(nearest["a.jpg"], vec!["b.jpg".to_owned(), "c.jpg".to_owned()]);
    }

    #[test]
    fn neighbor_cap_applies_before_pairs_collapse() {
        let images = images(&[("a.jpg", None), ("b.jpg", None), ("c.jpg", None)]);
        let selector = CandidateSelector {
            max_neighbors: 1,
            ..Default::default()
        };
        // b and c both pick a as their nearest image, a picks b.
        let candidates = selector.select(&images);
        assert_eq!(candidates["a.jpg"], vec!["b.jpg".to_owned(), "c.jpg".to_owned()]);
        assert!(candidates["b.jpg"].is_empty());
        assert!(candidates["c.jpg"].is_empty());
    }

    #[test]
    fn pairs_are_canonical_and_unique() {
        let images = images(&[
            ("c.jpg", Some((0.0, 0.0))),
            ("a.jpg", Some((0.0, 0.0001))),
            ("b.jpg", Some((0.0001, 0.0))),
        ]);
        let candidates = CandidateSelector::default().select(&images);
        let mut seen = BTreeSet::new();
        for (im1, partners) in &candidates {
            for im2 in partners {
                assert_ne!(im1, im2);
                assert!(im1 < im2);
                assert!(seen.insert(Pair::new(im1, im2)));
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn order_neighbors_ignore_gps() {
        let images = images(&[
            ("0.jpg", Some((0.0, 0.0))),
            ("1.jpg", Some((1.0, 0.0))),
            ("2.jpg", Some((2.0, 0.0))),
            ("3.jpg", Some((3.0, 0.0))),
        ]);
        let selector = CandidateSelector {
            max_distance: 10.0,
            order_neighbors: 1,
            ..Default::default()
        };
        let candidates = selector.select(&images);
        assert_eq!(candidates["0.jpg"], vec!["1.jpg".to_owned()]);
        assert_eq!(candidates["1.jpg"], vec!["2.jpg".to_owned()]);
        assert_eq!(candidates["2.jpg"], vec!["3.jpg".to_owned()]);
        assert!(candidates["3.jpg"].is_empty());
    }

    #[test]
    fn distance_filter_is_symmetric() {
        let images = images(&[
            ("a.jpg", Some((0.0, 0.0))),
            ("b.jpg", Some((0.0003, 0.0))),
            ("c.jpg", Some((0.0, 0.0004))),
            ("d.jpg", None),
        ]);
        let selector = CandidateSelector {
            max_distance: 40.0,
            ..Default::default()
        };
        let nearest = selector.nearest(&images);
        for (im1, list) in &nearest {
            for im2 in list {
                assert!(nearest[im2].contains(im1), "{} -> {} is not mutual", im1, im2);
            }
        }
    }
}
