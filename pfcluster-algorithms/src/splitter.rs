//! Fractional energy sharing among the seeds of one topo-cluster.
//!
//! Each seed starts as a one-cell cluster. Every other member cell is then
//! shared among the clusters with weights
//! `E_j * exp(-d^2 / (2 sigma^2))`, where `E_j` is the current energy of
//! cluster `j` and `d` the distance from the cell to its centroid. Fractions
//! and centroids are recomputed in turn until the centroids stop moving or
//! the iteration limit is reached. Reaching the limit is not an error: the
//! last iterate is kept.

use log::{debug, trace};
use pfcluster_core::{Cell, CellFraction, ClusteringConfig, DistanceMetric, EtaPhi, Point3};

use crate::position::PositionCalculator;
use crate::topo::TopoCluster;

/// Result of splitting one topo-cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    /// Member fractions, one list per seed in seed order.
    pub fractions: Vec<Vec<CellFraction>>,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the centroid shift fell below the tolerance.
    pub converged: bool,
}

/// Provisional cluster state during iteration.
#[derive(Debug, Clone, Copy)]
struct Provisional {
    seed: usize,
    energy: f64,
    position: Point3,
    eta_phi: EtaPhi,
}

/// Iterative Gaussian energy sharing.
#[derive(Debug, Clone, Copy)]
pub struct FractionalSplitter<'a> {
    config: &'a ClusteringConfig,
}

impl<'a> FractionalSplitter<'a> {
    /// Creates a splitter bound to a configuration.
    #[must_use]
    pub fn new(config: &'a ClusteringConfig) -> Self {
        Self { config }
    }

    /// Shares the members of `topo` among its seeds.
    ///
    /// # Panics
    /// Panics if the topo-cluster has no seed.
    #[must_use]
    pub fn split(&self, cells: &[Cell], topo: &TopoCluster) -> SplitOutcome {
        assert!(
            !topo.seeds.is_empty(),
            "topo-cluster of {} cells has no seed",
            topo.len()
        );

        let splitter = &self.config.splitter;
        let calculator = PositionCalculator::new(self.config);
        let mut clusters: Vec<Provisional> = topo
            .seeds
            .iter()
            .map(|&seed| Provisional {
                seed,
                energy: cells[seed].energy,
                position: cells[seed].position,
                eta_phi: cells[seed].eta_phi,
            })
            .collect();
        let mut fractions: Vec<Vec<CellFraction>> = vec![Vec::new(); clusters.len()];
        let mut weights = vec![0.0; clusters.len()];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < splitter.max_iterations {
            iterations += 1;

            for (list, cluster) in fractions.iter_mut().zip(&clusters) {
                list.clear();
                list.push(CellFraction::new(cluster.seed, 1.0));
            }

            for &c in &topo.cells {
                if topo.seeds.binary_search(&c).is_ok() {
                    continue;
                }
                self.share(&cells[c], &clusters, &mut weights);
                let total: f64 = weights.iter().sum();

                if total > 0.0 && total.is_finite() {
                    for (j, &w) in weights.iter().enumerate() {
                        let fraction = w / total;
                        if fraction > splitter.min_fraction {
                            fractions[j].push(CellFraction::new(c, fraction));
                        }
                    }
                } else {
                    // Out of reach of every cluster: give it to the nearest.
                    let nearest = self.nearest(&cells[c], &clusters);
                    fractions[nearest].push(CellFraction::new(c, 1.0));
                }
            }

            let mut shift = 0.0;
            for (cluster, list) in clusters.iter_mut().zip(&fractions) {
                let position = calculator.centroid(cells, list, cluster.seed);
                let eta_phi = position.eta_phi();
                shift += match self.config.metric {
                    DistanceMetric::Physical => position.distance(&cluster.position),
                    DistanceMetric::Angular => eta_phi.distance(&cluster.eta_phi),
                };
                cluster.energy = PositionCalculator::energy(cells, list);
                cluster.position = position;
                cluster.eta_phi = eta_phi;
            }
            trace!("split iteration {iterations}: centroid shift {shift:.6}");

            if shift < splitter.tolerance {
                converged = true;
                break;
            }
        }

        if self.config.debug {
            debug!(
                "split topo-cluster of {} cells into {} clusters after {} iterations (converged: {})",
                topo.len(),
                clusters.len(),
                iterations,
                converged
            );
        }

        SplitOutcome {
            fractions,
            iterations,
            converged,
        }
    }

    fn distance(&self, cell: &Cell, cluster: &Provisional) -> f64 {
        match self.config.metric {
            DistanceMetric::Physical => cell.position.distance(&cluster.position),
            DistanceMetric::Angular => cell.eta_phi.distance(&cluster.eta_phi),
        }
    }

    /// Fills `weights` with the unnormalized share of `cell` per cluster.
    fn share(&self, cell: &Cell, clusters: &[Provisional], weights: &mut [f64]) {
        let sigma = self.config.shower_sigma;
        let max_distance = self.config.splitter.max_sigma_distance;
        for (w, cluster) in weights.iter_mut().zip(clusters) {
            let d = self.distance(cell, cluster) / sigma;
            *w = if d > max_distance {
                0.0
            } else {
                cluster.energy.max(0.0) * (-0.5 * d * d).exp()
            };
        }
    }

    fn nearest(&self, cell: &Cell, clusters: &[Provisional]) -> usize {
        clusters
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                self.distance(cell, a)
                    .total_cmp(&self.distance(cell, b))
            })
            .map_or(0, |(j, _)| j)
    }
}
