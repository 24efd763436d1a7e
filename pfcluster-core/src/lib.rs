//! pfcluster-core: Core types for calorimeter topological clustering.
//!
//! This crate provides the data model shared by the clustering engine and
//! its collaborators: detector layers, cell records and resolved cells,
//! final clusters with energy fractions, and the clustering configuration.
//!

pub mod cell;
pub mod clustering;
pub mod cluster;
pub mod error;
pub mod geometry;
pub mod layer;

pub use cell::{Cell, CellRecord, EventRecords};
pub use cluster::{CellFraction, Cluster, ClusterCollection, ClusterSummary, ClusterType};
pub use clustering::{
    ClusteringConfig, ClusteringStatistics, Connectivity, DepthCorrection, DepthCorrectionMode,
    DistanceMetric, PositionCells, ReconstructionConfig, SplitterConfig, Thresholds,
};
pub use error::{Error, Result};
pub use geometry::{EtaPhi, Point3};
pub use layer::{Layer, Region, Subsystem};
