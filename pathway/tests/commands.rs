use pathway::{create_navigation_graph, match_features, CommandError};
use pathway_core::nalgebra::{Point3, Vector3};
use pathway_core::{CameraModel, Descriptor, Features, ImageMetadata, Reconstruction, ShotPose};
use pathway_data::DataSet;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

/// Random points in front of cameras on the X axis, with one descriptor per point.
fn scene(rng: &mut SmallRng) -> (Vec<Point3<f64>>, Vec<Descriptor>) {
    (0..80)
        .map(|_| {
            let point = Point3::new(
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(8.0..12.0),
            );
            let mut descriptor = Descriptor::zeros();
            rng.fill(&mut descriptor.bytes_mut()[..]);
            (point, descriptor)
        })
        .unzip()
}

fn view(points: &[Point3<f64>], descriptors: &[Descriptor], x: f64) -> Features {
    Features {
        points: points
            .iter()
            .map(|p| [(p.x - x) / p.z, p.y / p.z])
            .collect(),
        descriptors: descriptors.to_vec(),
        colors: vec![[0, 0, 0]; points.len()],
    }
}

/// Two overlapping images near each other and a third one far away.
fn dataset() -> (TempDir, DataSet) {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DataSet::new(dir.path());
    let mut rng = SmallRng::seed_from_u64(1);
    let (points, descriptors) = scene(&mut rng);

    let mut cameras = BTreeMap::new();
    cameras.insert("camera".to_owned(), CameraModel::perspective(1000, 1000, 1.0));
    dataset.save_camera_models(&cameras).unwrap();

    let images = [("a.jpg", 0.0, 0.0), ("b.jpg", 0.00001, 1.0), ("far.jpg", 1.0, 0.0)];
    for (image, latitude, x) in images {
        dataset
            .save_exif(image, &ImageMetadata::new("camera").with_gps(latitude, 0.0))
            .unwrap();
        dataset
            .save_features(image, &view(&points, &descriptors, x))
            .unwrap();
    }
    fs::write(
        dir.path().join("config.json"),
        r#"{"matching_gps_distance": 100, "processes": 2}"#,
    )
    .unwrap();
    (dir, dataset)
}

#[test]
fn matching_saves_every_image() {
    let (dir, dataset) = dataset();
    let report = match_features(&dataset).unwrap();
    assert_eq!(report.candidates["a.jpg"], ["b.jpg"]);
    assert!(report.candidates["far.jpg"].is_empty());

    let matches = dataset.load_matches("a.jpg").unwrap();
    assert!(matches["b.jpg"].len() >= 20);
    assert!(dataset.load_matches("b.jpg").unwrap().is_empty());
    assert!(dataset.load_matches("far.jpg").unwrap().is_empty());

    let profile = fs::read_to_string(dir.path().join("profile.log")).unwrap();
    assert!(profile.starts_with("matching: "));
}

#[test]
fn matching_reports_failed_images() {
    let (_dir, dataset) = dataset();
    dataset
        .save_exif("b.jpg", &ImageMetadata::new("lost").with_gps(0.00001, 0.0))
        .unwrap();
    match match_features(&dataset) {
        Err(CommandError::IncompleteMatching(images)) => assert_eq!(images, ["a.jpg"]),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(dataset.load_matches("a.jpg").is_err());
    assert!(dataset.load_matches("b.jpg").unwrap().is_empty());
}

#[test]
fn navigation_graph_is_created() {
    let (dir, dataset) = dataset();
    let mut reconstruction = Reconstruction::default();
    for (ix, shot) in ["a.jpg", "b.jpg", "far.jpg"].iter().enumerate() {
        let center = Point3::new(0.0, 5.0 * ix as f64, 0.0);
        reconstruction.add_shot(*shot, ShotPose::looking_towards(center, Vector3::y()));
    }
    dataset.save_reconstructions(&[reconstruction]).unwrap();

    let graphs = create_navigation_graph(&dataset).unwrap();
    assert_eq!(graphs.len(), 1);
    let records = dataset.load_navigation_graphs().unwrap();
    assert_eq!(records[0].nodes, ["a.jpg", "b.jpg", "far.jpg"]);
    assert_eq!(records[0].edges["a.jpg"].pref["b.jpg"].weight, graphs[0].edges[0].weight);

    let profile = fs::read_to_string(dir.path().join("profile.log")).unwrap();
    assert!(profile.starts_with("navigation_graph: "));
}

#[test]
fn missing_reconstruction_is_an_error() {
    let (_dir, dataset) = dataset();
    assert!(matches!(
        create_navigation_graph(&dataset),
        Err(CommandError::Data(_))
    ));
}
