//! Per-event clustering of the three calorimeter subsystems.

use std::sync::Arc;

use log::debug;
use pfcluster_core::{
    ClusterCollection, ClusteringStatistics, EventRecords, ReconstructionConfig, Subsystem,
};

use crate::engine::TopoClusterEngine;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cluster collections of one event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventClusters {
    /// ECAL clusters.
    pub ecal: ClusterCollection,
    /// HCAL clusters.
    pub hcal: ClusterCollection,
    /// Preshower clusters.
    pub preshower: ClusterCollection,
}

impl EventClusters {
    /// Empty collections for all subsystems.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ecal: ClusterCollection::empty(Subsystem::Ecal),
            hcal: ClusterCollection::empty(Subsystem::Hcal),
            preshower: ClusterCollection::empty(Subsystem::Preshower),
        }
    }

    /// Collection of one subsystem.
    #[must_use]
    pub fn collection(&self, subsystem: Subsystem) -> &ClusterCollection {
        match subsystem {
            Subsystem::Ecal => &self.ecal,
            Subsystem::Hcal => &self.hcal,
            Subsystem::Preshower => &self.preshower,
        }
    }

    /// Number of clusters over all subsystems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ecal.len() + self.hcal.len() + self.preshower.len()
    }

    /// Returns true if no subsystem produced a cluster.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Three engines sharing one read-only run configuration.
///
/// The subsystems share no cell or cluster state, so they are clustered on
/// the rayon pool concurrently; `process` returns once all three are done.
#[derive(Debug)]
pub struct EventClusterer {
    config: Arc<ReconstructionConfig>,
    ecal: TopoClusterEngine,
    hcal: TopoClusterEngine,
    preshower: TopoClusterEngine,
}

impl EventClusterer {
    /// Creates the three engines from a run configuration.
    #[must_use]
    pub fn new(config: Arc<ReconstructionConfig>) -> Self {
        let engine = |subsystem| {
            TopoClusterEngine::new(subsystem, config.config_for(subsystem).clone())
                .with_neighbour_finding(config.find_neighbours)
        };
        Self {
            ecal: engine(Subsystem::Ecal),
            hcal: engine(Subsystem::Hcal),
            preshower: engine(Subsystem::Preshower),
            config,
        }
    }

    /// Run configuration.
    #[must_use]
    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Engine of one subsystem, for seed and registry queries.
    #[must_use]
    pub fn engine(&self, subsystem: Subsystem) -> &TopoClusterEngine {
        match subsystem {
            Subsystem::Ecal => &self.ecal,
            Subsystem::Hcal => &self.hcal,
            Subsystem::Preshower => &self.preshower,
        }
    }

    /// Returns true if cell `index` of `subsystem` is a seed in the last event.
    #[must_use]
    pub fn is_seed(&self, subsystem: Subsystem, index: usize) -> bool {
        self.engine(subsystem).is_seed(index)
    }

    /// Clusters one event.
    ///
    /// With clustering switched off every collection is empty.
    pub fn process(&mut self, event: &EventRecords) -> EventClusters {
        if !self.config.clustering_on {
            debug!("clustering is off, returning empty collections");
            return EventClusters::empty();
        }

        let (ecal, hcal, preshower) = (&mut self.ecal, &mut self.hcal, &mut self.preshower);
        let (ecal_clusters, (hcal_clusters, ps_clusters)) = rayon::join(
            || ecal.process(&event.ecal),
            || {
                rayon::join(
                    || hcal.process(&event.hcal),
                    || preshower.process(&event.preshower),
                )
            },
        );

        EventClusters {
            ecal: ecal_clusters,
            hcal: hcal_clusters,
            preshower: ps_clusters,
        }
    }

    /// Counters of the last event, summed over subsystems.
    #[must_use]
    pub fn statistics(&self) -> ClusteringStatistics {
        let mut total = *self.ecal.statistics();
        total.merge(self.hcal.statistics());
        total.merge(self.preshower.statistics());
        total
    }
}
