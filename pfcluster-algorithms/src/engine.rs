//! Generic clustering engine, instantiated once per subsystem.

use log::debug;
use pfcluster_core::{
    CellFraction, CellRecord, Cluster, ClusterCollection, ClusterType, ClusteringConfig,
    ClusteringStatistics, Subsystem,
};

use crate::position::PositionCalculator;
use crate::registry::CellRegistry;
use crate::seeds::{find_seeds, SeedSet};
use crate::splitter::FractionalSplitter;
use crate::topo::build_topo_clusters;

/// Topological clustering of one subsystem.
///
/// The engine owns the cell registry and the seed flags of the last event,
/// so they stay queryable after [`process`](Self::process) returns.
#[derive(Debug)]
pub struct TopoClusterEngine {
    subsystem: Subsystem,
    config: ClusteringConfig,
    find_neighbours: bool,
    registry: CellRegistry,
    seeds: SeedSet,
    statistics: ClusteringStatistics,
}

impl TopoClusterEngine {
    /// Creates an engine with a fixed configuration.
    #[must_use]
    pub fn new(subsystem: Subsystem, config: ClusteringConfig) -> Self {
        Self {
            subsystem,
            config,
            find_neighbours: true,
            registry: CellRegistry::new(),
            seeds: SeedSet::default(),
            statistics: ClusteringStatistics::default(),
        }
    }

    /// Enables or disables neighbour resolution on load.
    #[must_use]
    pub fn with_neighbour_finding(mut self, enabled: bool) -> Self {
        self.find_neighbours = enabled;
        self
    }

    /// Subsystem this engine clusters.
    #[must_use]
    pub fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Registry holding the last event's cells.
    #[must_use]
    pub fn registry(&self) -> &CellRegistry {
        &self.registry
    }

    /// Returns true if cell `index` of the last event is a seed.
    #[must_use]
    pub fn is_seed(&self, index: usize) -> bool {
        self.seeds.is_seed(index)
    }

    /// Counters of the last event.
    #[must_use]
    pub fn statistics(&self) -> &ClusteringStatistics {
        &self.statistics
    }

    /// Clusters one event's cells.
    pub fn process(&mut self, records: &[CellRecord]) -> ClusterCollection {
        self.statistics = ClusteringStatistics::default();
        self.registry.load_with(records, self.find_neighbours);
        let cells = self.registry.cells();

        self.seeds = find_seeds(cells, &self.config.thresholds);
        let topo_clusters = build_topo_clusters(
            cells,
            &self.seeds,
            &self.config.thresholds,
            self.config.connectivity,
        );

        let splitter = FractionalSplitter::new(&self.config);
        let mut clusters = Vec::with_capacity(self.seeds.len());
        let mut stats = ClusteringStatistics {
            cells_loaded: self.registry.len(),
            duplicates_skipped: self.registry.duplicates_skipped(),
            neighbours_dropped: self.registry.neighbours_dropped(),
            seeds_found: self.seeds.len(),
            topo_clusters: topo_clusters.len(),
            ..Default::default()
        };

        for topo in &topo_clusters {
            match topo.seeds.as_slice() {
                [] => unreachable!("topo-clusters are grown from seeds"),
                &[seed] => {
                    let fractions = topo
                        .cells
                        .iter()
                        .map(|&c| CellFraction::new(c, 1.0))
                        .collect();
                    clusters.push(Cluster::new(
                        clusters.len(),
                        ClusterType::Topological,
                        cells[seed].layer,
                        seed,
                        fractions,
                    ));
                }
                seeds => {
                    let outcome = splitter.split(cells, topo);
                    stats.split_topo_clusters += 1;
                    stats.split_iterations += outcome.iterations;
                    if !outcome.converged {
                        stats.non_converged += 1;
                    }
                    for (&seed, fractions) in seeds.iter().zip(outcome.fractions) {
                        clusters.push(Cluster::new(
                            clusters.len(),
                            ClusterType::Shared,
                            cells[seed].layer,
                            seed,
                            fractions,
                        ));
                    }
                }
            }
        }

        let calculator = PositionCalculator::new(&self.config);
        for cluster in &mut clusters {
            calculator.update(cluster, cells);
        }

        stats.clusters_found = clusters.len();
        self.statistics = stats;
        debug!(
            "{}: {} cells, {} seeds, {} topo-clusters, {} clusters ({} split, {} not converged)",
            self.subsystem,
            stats.cells_loaded,
            stats.seeds_found,
            stats.topo_clusters,
            stats.clusters_found,
            stats.split_topo_clusters,
            stats.non_converged
        );

        ClusterCollection::new(self.subsystem, clusters, self.seeds.flags().to_vec())
    }

    /// Recomputes positions of a collection produced by the last event.
    ///
    /// Must be called after any change to membership or fractions.
    pub fn recalculate_positions(&self, collection: &mut ClusterCollection) {
        PositionCalculator::new(&self.config).update_all(collection, self.registry.cells());
    }
}
