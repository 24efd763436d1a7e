#![allow(clippy::float_cmp)]
use approx::assert_abs_diff_eq;
use pfcluster_algorithms::TopoClusterEngine;
use pfcluster_core::{CellRecord, ClusterType, ClusteringConfig, Layer, Point3, Subsystem};

fn ecal_engine() -> TopoClusterEngine {
    TopoClusterEngine::new(Subsystem::Ecal, ClusteringConfig::ecal_defaults())
}

fn barrel(id: u32, x: f64, energy: f64, neighbours: &[u32]) -> CellRecord {
    CellRecord::new(id, energy, Layer::EcalBarrel, Point3::new(x, 129.0, 0.0))
        .with_neighbours(neighbours.to_vec(), neighbours.to_vec())
}

#[test]
fn test_isolated_cell_forms_single_cluster() {
    // Declared neighbours are absent from the event.
    let records = vec![barrel(100, 3.0, 5.0, &[101, 99])];
    let mut engine = ecal_engine();
    let clusters = engine.process(&records);

    assert_eq!(clusters.len(), 1);
    let cluster = &clusters.clusters()[0];
    assert_eq!(cluster.fractions.len(), 1);
    assert_eq!(cluster.fractions[0].cell, 0);
    assert_eq!(cluster.fractions[0].fraction, 1.0);
    assert_eq!(cluster.cluster_type, ClusterType::Topological);
    assert_abs_diff_eq!(cluster.energy, 5.0);
    assert_abs_diff_eq!(cluster.position.x, 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cluster.position.y, 129.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cluster.position.z, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cluster.eta_phi.phi, records[0].position.phi(), epsilon = 1e-12);
    assert_eq!(cluster.depth_corrected, cluster.position);
    assert!(clusters.is_seed(0));
}

#[test]
fn test_two_seeds_share_middle_cell() {
    let records = vec![
        barrel(1, 0.0, 3.0, &[2]),
        barrel(2, 2.2, 0.5, &[1, 3]),
        barrel(3, 4.4, 1.0, &[2]),
    ];
    let config = ClusteringConfig::ecal_defaults().with_shower_sigma(3.0);
    let mut engine = TopoClusterEngine::new(Subsystem::Ecal, config);
    let clusters = engine.process(&records);

    assert_eq!(clusters.len(), 2);
    assert!(clusters.is_seed(0));
    assert!(!clusters.is_seed(1));
    assert!(clusters.is_seed(2));

    let first = &clusters.clusters()[0];
    let second = &clusters.clusters()[1];
    assert_eq!(first.cluster_type, ClusterType::Shared);
    assert_eq!(first.seed, 0);
    assert_eq!(second.seed, 2);

    let f1 = first.fraction_of(1);
    let f2 = second.fraction_of(1);
    assert_abs_diff_eq!(f1 + f2, 1.0, epsilon = 1e-9);
    assert!(f1 > f2, "the 3.0 seed should take the larger share");

    // Converged fractions follow energy * Gaussian of the centroid distance.
    let middle = Point3::new(2.2, 129.0, 0.0);
    let weight = |energy: f64, position: Point3| {
        let d = middle.distance(&position) / 3.0;
        energy * (-0.5 * d * d).exp()
    };
    let w1 = weight(first.energy, first.position);
    let w2 = weight(second.energy, second.position);
    assert_abs_diff_eq!(f1, w1 / (w1 + w2), epsilon = 1e-3);

    // Seeds stay whole.
    assert_eq!(first.fraction_of(0), 1.0);
    assert_eq!(second.fraction_of(2), 1.0);
    assert_eq!(first.fraction_of(2), 0.0);
}

#[test]
fn test_cells_below_threshold_make_no_clusters() {
    let records = vec![
        barrel(1, 0.0, 0.05, &[2]),
        barrel(2, 2.2, 0.08, &[1, 3]),
        barrel(3, 4.4, 0.06, &[2]),
    ];
    let mut engine = ecal_engine();
    let clusters = engine.process(&records);

    assert!(clusters.is_empty());
    assert!((0..3).all(|i| !clusters.is_seed(i)));
}

#[test]
fn test_equal_adjacent_maxima_keep_lower_index() {
    let records = vec![
        barrel(1, 0.0, 0.2, &[2]),
        barrel(2, 2.2, 1.5, &[1, 3]),
        barrel(3, 4.4, 1.5, &[2, 4]),
        barrel(4, 6.6, 0.2, &[3]),
    ];
    let mut engine = ecal_engine();
    let clusters = engine.process(&records);

    assert!(engine.is_seed(1));
    assert!(!engine.is_seed(2));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters.clusters()[0].seed, 1);
    assert_eq!(clusters.clusters()[0].fractions.len(), 4);
}

#[test]
fn test_empty_event_gives_empty_collection() {
    let mut engine = ecal_engine();
    assert!(engine.process(&[]).is_empty());
}
