#![allow(
    clippy::float_cmp,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
use approx::assert_abs_diff_eq;
use pfcluster_algorithms::{CellRegistry, TopoClusterEngine};
use pfcluster_core::{CellRecord, ClusteringConfig, Layer, Point3, Subsystem};

const SIDE: i32 = 9;
const PITCH: f64 = 2.2;

fn id(ix: i32, iy: i32) -> u32 {
    (ix * 100 + iy + 1000) as u32
}

/// Square patch of barrel crystals with a few overlapping showers.
///
/// Neighbour ids at the patch border point outside it and must be dropped.
fn patch() -> Vec<CellRecord> {
    let showers = [(2.0, 2.0, 6.0), (5.0, 3.0, 4.0), (6.0, 7.0, 2.5)];
    let mut records = Vec::new();
    for ix in 0..SIDE {
        for iy in 0..SIDE {
            let energy: f64 = showers
                .iter()
                .map(|&(sx, sy, e)| {
                    let d2 = (f64::from(ix) - sx).powi(2) + (f64::from(iy) - sy).powi(2);
                    e * (-d2 / 1.5).exp()
                })
                .sum();
            let mut n4 = Vec::new();
            let mut n8 = Vec::new();
            for dx in -1..=1 {
                for dy in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    n8.push(id(ix + dx, iy + dy));
                    if dx == 0 || dy == 0 {
                        n4.push(id(ix + dx, iy + dy));
                    }
                }
            }
            let position = Point3::new(f64::from(ix) * PITCH, 129.0, f64::from(iy) * PITCH);
            records.push(
                CellRecord::new(id(ix, iy), energy, Layer::EcalBarrel, position)
                    .with_neighbours(n4, n8),
            );
        }
    }
    records
}

#[test]
fn test_no_dangling_neighbour_indices() {
    let mut registry = CellRegistry::new();
    registry.load(&patch());
    let n = registry.len();
    for cell in registry.cells() {
        assert!(cell.neighbours4.iter().all(|&j| j < n));
        assert!(cell.neighbours8.iter().all(|&j| j < n));
        assert!(cell.neighbours4.len() <= 4);
    }
    assert!(registry.neighbours_dropped() > 0);
}

#[test]
fn test_seeds_are_exactly_the_local_maxima() {
    let mut engine = TopoClusterEngine::new(Subsystem::Ecal, ClusteringConfig::ecal_defaults());
    let _ = engine.process(&patch());
    let cells = engine.registry().cells();
    let seed_threshold = engine.config().thresholds.seed(Layer::EcalBarrel);

    for (i, cell) in cells.iter().enumerate() {
        let local_max = cell.neighbours8.iter().all(|&j| {
            cells[j].energy < cell.energy || (cells[j].energy == cell.energy && j > i)
        });
        let expected = cell.energy >= seed_threshold && local_max;
        assert_eq!(engine.is_seed(i), expected, "cell {i}");
    }
    assert_eq!(engine.statistics().seeds_found, 3);
}

#[test]
fn test_fractions_sum_to_one_per_cell() {
    let mut engine = TopoClusterEngine::new(Subsystem::Ecal, ClusteringConfig::ecal_defaults());
    let clusters = engine.process(&patch());
    let n = engine.registry().len();
    let threshold = engine.config().thresholds.cell(Layer::EcalBarrel);

    let mut totals = vec![0.0; n];
    for cluster in &clusters {
        for f in &cluster.fractions {
            assert!(f.fraction > 0.0 && f.fraction <= 1.0);
            totals[f.cell] += f.fraction;
        }
    }
    for (i, cell) in engine.registry().cells().iter().enumerate() {
        if cell.energy >= threshold {
            // the patch is one connected blob above threshold
            assert_abs_diff_eq!(totals[i], 1.0, epsilon = 1e-6);
        } else {
            assert_eq!(totals[i], 0.0);
        }
    }
}

#[test]
fn test_single_seed_topo_clusters_have_unit_fractions() {
    let config = ClusteringConfig::hcal_defaults();
    let records: Vec<CellRecord> = (0..5u32)
        .map(|i| {
            let x = f64::from(i) * 20.0;
            let mut n8 = Vec::new();
            if i > 0 {
                n8.push(i - 1);
            }
            n8.push(i + 1);
            CellRecord::new(i, 4.0 - f64::from(i), Layer::HcalBarrel1, Point3::new(x, 190.0, 0.0))
                .with_neighbours(n8.clone(), n8)
        })
        .collect();
    let mut engine = TopoClusterEngine::new(Subsystem::Hcal, config);
    let clusters = engine.process(&records);

    assert_eq!(clusters.len(), 1);
    let cluster = &clusters.clusters()[0];
    // the last cell has no energy and stays out
    assert_eq!(cluster.fractions.len(), 4);
    assert!(cluster.fractions.iter().all(|f| f.fraction == 1.0));
    assert_abs_diff_eq!(cluster.energy, 10.0);
}

#[test]
fn test_position_recalculation_is_idempotent() {
    let mut engine = TopoClusterEngine::new(Subsystem::Ecal, ClusteringConfig::ecal_defaults());
    let mut clusters = engine.process(&patch());
    let first = clusters.clone();
    engine.recalculate_positions(&mut clusters);
    engine.recalculate_positions(&mut clusters);
    assert_eq!(first, clusters);
}

#[test]
fn test_energy_is_conserved() {
    let mut engine = TopoClusterEngine::new(Subsystem::Ecal, ClusteringConfig::ecal_defaults());
    let clusters = engine.process(&patch());
    let threshold = engine.config().thresholds.cell(Layer::EcalBarrel);
    let clustered: f64 = engine
        .registry()
        .cells()
        .iter()
        .filter(|c| c.energy >= threshold)
        .map(|c| c.energy)
        .sum();
    assert_abs_diff_eq!(clusters.total_energy(), clustered, epsilon = 1e-6);
}
