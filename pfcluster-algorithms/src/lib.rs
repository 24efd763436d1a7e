//! pfcluster-algorithms: Topological clustering of calorimeter rechits.
//!
//! The pipeline for one subsystem and one event:
//! - **Registry** - cell arena with neighbour ids resolved to indices
//! - **Seeds** - local energy maxima above the seed threshold
//! - **Topo-clusters** - connected above-threshold cells grown from seeds
//! - **Splitter** - Gaussian energy sharing among the seeds of a topo-cluster
//! - **Position** - weighted centroids and shower-depth correction
//!
//! [`TopoClusterEngine`] runs the pipeline for one subsystem and
//! [`EventClusterer`] runs ECAL, HCAL and preshower side by side.
#![warn(missing_docs)]

mod engine;
mod event;
pub mod position;
pub mod registry;
pub mod seeds;
pub mod splitter;
pub mod topo;

pub use engine::TopoClusterEngine;
pub use event::{EventClusterer, EventClusters};
pub use position::{depth_corrected, PositionCalculator};
pub use registry::CellRegistry;
pub use seeds::{find_seeds, SeedSet};
pub use splitter::{FractionalSplitter, SplitOutcome};
pub use topo::{build_topo_clusters, TopoCluster};

// Re-export core configuration types
pub use pfcluster_core::clustering::{ClusteringConfig, ClusteringStatistics};
