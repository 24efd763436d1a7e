//! Topological cluster growth from seeds.

use pfcluster_core::{Cell, Connectivity, Thresholds};

use crate::seeds::SeedSet;

/// A connected group of above-threshold cells with its seeds.
///
/// Only lives while an event is being clustered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopoCluster {
    /// Member cell indices, increasing.
    pub cells: Vec<usize>,
    /// Seed indices among the members, increasing.
    pub seeds: Vec<usize>,
}

impl TopoCluster {
    /// Number of member cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the topo-cluster has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Grows topo-clusters from all seeds.
///
/// A cell joins when its energy reaches the general threshold of its layer
/// and it is connected to a seed through cells that also do. Seeds always
/// join. Several seeds reached from one another end up in the same
/// topo-cluster. Cells reached from no seed are left out.
#[must_use]
pub fn build_topo_clusters(
    cells: &[Cell],
    seeds: &SeedSet,
    thresholds: &Thresholds,
    connectivity: Connectivity,
) -> Vec<TopoCluster> {
    let mut assigned = vec![false; cells.len()];
    let mut topo_clusters = Vec::new();
    let mut frontier: Vec<usize> = Vec::new();

    for &seed in seeds.indices() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        frontier.clear();
        frontier.push(seed);

        // Breadth-first: the frontier only grows, `next` walks it.
        let mut next = 0;
        while next < frontier.len() {
            let current = frontier[next];
            next += 1;

            let neighbours = match connectivity {
                Connectivity::Four => &cells[current].neighbours4,
                Connectivity::Eight => &cells[current].neighbours8,
            };
            for &n in neighbours {
                if assigned[n] {
                    continue;
                }
                let cell = &cells[n];
                if seeds.is_seed(n) || cell.energy >= thresholds.cell(cell.layer) {
                    assigned[n] = true;
                    frontier.push(n);
                }
            }
        }

        let mut members = frontier.clone();
        members.sort_unstable();
        let topo_seeds = members
            .iter()
            .copied()
            .filter(|&i| seeds.is_seed(i))
            .collect();
        topo_clusters.push(TopoCluster {
            cells: members,
            seeds: topo_seeds,
        });
    }

    topo_clusters
}

#[cfg(test)]
mod tests {
    #![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    use super::*;
    use crate::seeds::find_seeds;
    use pfcluster_core::{Layer, Point3};

    /// Cells on a line, each linked to the previous and next one.
    fn chain(energies: &[f64]) -> Vec<Cell> {
        let n = energies.len();
        energies
            .iter()
            .enumerate()
            .map(|(i, &energy)| {
                let mut n8 = Vec::new();
                if i > 0 {
                    n8.push(i - 1);
                }
                if i + 1 < n {
                    n8.push(i + 1);
                }
                let position = Point3::new(i as f64, 0.0, 0.0);
                Cell {
                    detector_id: i as u32,
                    energy,
                    layer: Layer::EcalBarrel,
                    position,
                    eta_phi: position.eta_phi(),
                    corners: [Point3::ORIGIN; 4],
                    neighbours4: Vec::new(),
                    neighbours8: n8,
                }
            })
            .collect()
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(0.1, 0.3, 0.2, 0.8)
    }

    #[test]
    fn test_growth_stops_below_threshold() {
        let cells = chain(&[0.2, 1.0, 0.2, 0.05, 0.2, 0.9]);
        let seeds = find_seeds(&cells, &thresholds());
        let topo = build_topo_clusters(&cells, &seeds, &thresholds(), Connectivity::Eight);

        assert_eq!(topo.len(), 2);
        assert_eq!(topo[0].cells, vec![0, 1, 2]);
        assert_eq!(topo[0].seeds, vec![1]);
        assert_eq!(topo[1].cells, vec![4, 5]);
    }

    #[test]
    fn test_connected_seeds_share_topo_cluster() {
        let cells = chain(&[1.0, 0.2, 0.8]);
        let seeds = find_seeds(&cells, &thresholds());
        let topo = build_topo_clusters(&cells, &seeds, &thresholds(), Connectivity::Eight);

        assert_eq!(topo.len(), 1);
        assert_eq!(topo[0].seeds, vec![0, 2]);
        assert_eq!(topo[0].len(), 3);
    }

    #[test]
    fn test_four_connectivity_uses_edge_neighbours() {
        // No 4-neighbour links at all: every seed stays alone.
        let cells = chain(&[1.0, 0.2, 0.8]);
        let seeds = find_seeds(&cells, &thresholds());
        let topo = build_topo_clusters(&cells, &seeds, &thresholds(), Connectivity::Four);

        assert_eq!(topo.len(), 2);
        assert!(topo.iter().all(|t| t.cells.len() == 1));
    }

    #[test]
    fn test_no_seeds_no_topo_clusters() {
        let cells = chain(&[0.15, 0.2, 0.15]);
        let seeds = find_seeds(&cells, &thresholds());
        assert!(build_topo_clusters(&cells, &seeds, &thresholds(), Connectivity::Eight).is_empty());
    }
}
