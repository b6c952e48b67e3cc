use pathway_core::bitarray::BitArray;
use pathway_core::nalgebra::{Point3, Vector3};
use pathway_core::{
    CameraModel, Features, ImageMetadata, MatchMap, ProjectionType, Reconstruction, ShotPose,
};
use pathway_data::DataSet;
use pathway_match::{FeatureStore, MatchError};
use pathway_nav::NavigationGraphBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

fn features(count: usize) -> Features {
    Features {
        points: (0..count).map(|ix| [ix as f64 * 0.01, -0.1]).collect(),
        descriptors: (0..count)
            .map(|ix| {
                let mut descriptor = BitArray::zeros();
                descriptor.bytes_mut()[0] = ix as u8;
                descriptor
            })
            .collect(),
        colors: vec![[10, 20, 30]; count],
    }
}

#[test]
fn images_are_listed_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    for image in ["b.jpg", "c.jpg", "a.jpg"] {
        dataset
            .save_exif(image, &ImageMetadata::new("camera").with_gps(1.0, 2.0))
            .unwrap();
    }
    fs::write(dir.path().join("exif").join("notes.txt"), "ignored").unwrap();

    assert_eq!(dataset.images().unwrap(), ["a.jpg", "b.jpg", "c.jpg"]);
    let metadata = dataset.load_image_metadata().unwrap();
    assert_eq!(metadata.len(), 3);
    assert_eq!(metadata["a.jpg"].camera, "camera");
    assert!(metadata["a.jpg"].gps.is_some());
}

#[test]
fn features_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    let saved = features(20);
    dataset.save_features("a.jpg", &saved).unwrap();
    assert_eq!(DataSet::load_features(&dataset, "a.jpg").unwrap(), saved);
}

#[test]
fn missing_preemptive_features_are_absent() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    assert_eq!(DataSet::load_preemptive_features(&dataset, "a.jpg").unwrap(), None);

    dataset.save_preemptive_features("a.jpg", &features(5)).unwrap();
    let loaded = DataSet::load_preemptive_features(&dataset, "a.jpg").unwrap();
    assert_eq!(loaded.map(|f| f.len()), Some(5));
}

#[test]
fn corrupt_preemptive_features_are_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    fs::create_dir_all(dir.path().join("preemptive")).unwrap();
    fs::write(dir.path().join("preemptive").join("a.jpg.bin"), [1u8, 2, 3]).unwrap();
    assert!(DataSet::load_preemptive_features(&dataset, "a.jpg").is_err());
}

#[test]
fn feature_store_reports_missing_features() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    let error = FeatureStore::load_features(&dataset, "missing.jpg").unwrap_err();
    assert!(matches!(error, MatchError::Storage(_)));
    assert!(error.to_string().contains("missing.jpg"));
}

#[test]
fn matches_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    let mut matches = MatchMap::new();
    matches.insert("b.jpg".to_owned(), vec![[0, 3], [4, 1]]);
    matches.insert("c.jpg".to_owned(), vec![]);
    dataset.save_matches("a.jpg", &matches).unwrap();
    assert_eq!(dataset.load_matches("a.jpg").unwrap(), matches);
}

#[test]
fn camera_models_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    let mut cameras = BTreeMap::new();
    cameras.insert("phone".to_owned(), CameraModel::perspective(4000, 3000, 0.9));
    cameras.insert("360".to_owned(), CameraModel::spherical(2000, 1000));
    dataset.save_camera_models(&cameras).unwrap();

    let loaded = dataset.load_camera_models().unwrap();
    assert_eq!(loaded, cameras);
    assert_eq!(loaded["360"].projection_type, ProjectionType::Spherical);
}

#[test]
fn navigation_graph_is_saved_per_reconstruction() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    let mut reconstruction = Reconstruction::default();
    for (ix, shot) in ["a", "b", "c"].iter().enumerate() {
        reconstruction.add_shot(
            *shot,
            ShotPose::looking_towards(Point3::new(5.0 * ix as f64, 0.0, 0.0), Vector3::x()),
        );
    }
    dataset
        .save_reconstructions(&[reconstruction, Reconstruction::default()])
        .unwrap();

    let reconstructions = dataset.load_reconstructions().unwrap();
    assert_eq!(reconstructions.len(), 2);
    let graphs = NavigationGraphBuilder::default()
        .build_all(&reconstructions)
        .unwrap();
    let records: Vec<_> = graphs.iter().map(|graph| graph.to_record()).collect();
    dataset.save_navigation_graphs(&records).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("navigation_graph.json")).unwrap())
            .unwrap();
    assert_eq!(json[0]["nodes"], serde_json::json!(["a", "b", "c"]));
    assert_eq!(json[0]["edges"]["b"]["pref"]["c"]["direction"], "step_forward");
    assert_eq!(json[0]["edges"]["b"]["pos"]["a"]["direction"], "step_backward");
    assert_eq!(json[1]["nodes"], serde_json::json!([]));
    assert_eq!(dataset.load_navigation_graphs().unwrap(), records);
}

#[test]
fn profile_lines_are_appended() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    dataset
        .append_profile("matching", Duration::from_millis(1500))
        .unwrap();
    dataset
        .append_profile("navigation_graph", Duration::from_millis(250))
        .unwrap();
    let log = fs::read_to_string(dir.path().join("profile.log")).unwrap();
    assert_eq!(log, "matching: 1.5\nnavigation_graph: 0.25\n");
}
