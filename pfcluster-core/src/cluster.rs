//! Final clusters and the per-event cluster collection.

use std::fmt;

use crate::{EtaPhi, Layer, Point3, Subsystem};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Share of one cell's energy attributed to a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellFraction {
    /// Registry index of the cell.
    pub cell: usize,
    /// Fraction of the cell's energy, in `(0, 1]`.
    pub fraction: f64,
}

impl CellFraction {
    /// Creates a new cell fraction.
    #[inline]
    #[must_use]
    pub fn new(cell: usize, fraction: f64) -> Self {
        Self { cell, fraction }
    }
}

/// How a cluster came out of the topological stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClusterType {
    /// Sole seed of its topo-cluster; every member has fraction 1.
    Topological,
    /// One of several seeds of a topo-cluster; members are shared.
    Shared,
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterType::Topological => f.write_str("topo"),
            ClusterType::Shared => f.write_str("shared"),
        }
    }
}

/// A final cluster: cells referenced by index, with energy fractions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Position of the cluster in its collection.
    pub id: usize,
    /// Origin of the cluster.
    pub cluster_type: ClusterType,
    /// Layer of the seed cell.
    pub layer: Layer,
    /// Registry index of the seed cell.
    pub seed: usize,
    /// Member cells with their energy fractions.
    pub fractions: Vec<CellFraction>,
    /// Fraction-weighted energy.
    pub energy: f64,
    /// Cartesian position.
    pub position: Point3,
    /// Angular position.
    pub eta_phi: EtaPhi,
    /// Position shifted by the shower-depth correction.
    pub depth_corrected: Point3,
}

impl Cluster {
    /// Creates a cluster with no computed energy or position.
    #[must_use]
    pub fn new(
        id: usize,
        cluster_type: ClusterType,
        layer: Layer,
        seed: usize,
        fractions: Vec<CellFraction>,
    ) -> Self {
        Self {
            id,
            cluster_type,
            layer,
            seed,
            fractions,
            energy: 0.0,
            position: Point3::ORIGIN,
            eta_phi: EtaPhi::default(),
            depth_corrected: Point3::ORIGIN,
        }
    }

    /// Number of member cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// Returns true if the cluster has no member cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Fraction of `cell` held by this cluster, zero if not a member.
    #[must_use]
    pub fn fraction_of(&self, cell: usize) -> f64 {
        self.fractions
            .iter()
            .find(|f| f.cell == cell)
            .map_or(0.0, |f| f.fraction)
    }

    /// Flat summary for downstream event records.
    #[must_use]
    pub fn summary(&self) -> ClusterSummary {
        ClusterSummary {
            eta: self.eta_phi.eta,
            phi: self.eta_phi.phi,
            energy: self.energy,
            layer: self.layer,
            cluster_type: self.cluster_type,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cluster {} {} layer {} E {:.4} eta {:.4} phi {:.4} xyz ({:.2}, {:.2}, {:.2}) cells {}",
            self.id,
            self.cluster_type,
            self.layer,
            self.energy,
            self.eta_phi.eta,
            self.eta_phi.phi,
            self.position.x,
            self.position.y,
            self.position.z,
            self.fractions.len()
        )
    }
}

/// Per-cluster record handed to event summaries.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterSummary {
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Energy.
    pub energy: f64,
    /// Seed layer.
    pub layer: Layer,
    /// Cluster origin.
    pub cluster_type: ClusterType,
}

/// Clusters of one subsystem for one event, plus the seed flags of its cells.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterCollection {
    subsystem: Subsystem,
    clusters: Vec<Cluster>,
    seeds: Vec<bool>,
}

impl ClusterCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn empty(subsystem: Subsystem) -> Self {
        Self {
            subsystem,
            clusters: Vec::new(),
            seeds: Vec::new(),
        }
    }

    /// Creates a collection from clusters and one seed flag per registry cell.
    #[must_use]
    pub fn new(subsystem: Subsystem, clusters: Vec<Cluster>, seeds: Vec<bool>) -> Self {
        Self {
            subsystem,
            clusters,
            seeds,
        }
    }

    /// Subsystem the clusters belong to.
    #[must_use]
    pub fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns true if there are no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster by id.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Cluster> {
        self.clusters.get(id)
    }

    /// Iterator over the clusters.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Mutable access, for position recalculation.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cluster> {
        self.clusters.iter_mut()
    }

    /// Clusters as a slice.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Returns true if cell `index` was selected as a seed.
    ///
    /// Out-of-range indices are not seeds.
    #[must_use]
    pub fn is_seed(&self, index: usize) -> bool {
        self.seeds.get(index).copied().unwrap_or(false)
    }

    /// Seed flags, one per registry cell.
    #[must_use]
    pub fn seed_flags(&self) -> &[bool] {
        &self.seeds
    }

    /// Sum of all cluster energies.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.clusters.iter().map(|c| c.energy).sum()
    }

    /// Summaries of all clusters, in id order.
    #[must_use]
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.clusters.iter().map(Cluster::summary).collect()
    }
}

impl<'a> IntoIterator for &'a ClusterCollection {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}
