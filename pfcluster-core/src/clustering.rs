//! Clustering configuration and statistics.

use crate::{Error, Layer, Region, Result, Subsystem};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Energy thresholds for one subsystem, split by region.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Thresholds {
    /// Minimum energy for a barrel cell to join a cluster.
    pub barrel: f64,
    /// Minimum energy for a barrel cell to be a seed.
    pub seed_barrel: f64,
    /// Minimum energy for an endcap cell to join a cluster.
    pub endcap: f64,
    /// Minimum energy for an endcap cell to be a seed.
    pub seed_endcap: f64,
}

impl Thresholds {
    /// Creates thresholds from the four values.
    #[must_use]
    pub fn new(barrel: f64, seed_barrel: f64, endcap: f64, seed_endcap: f64) -> Self {
        Self {
            barrel,
            seed_barrel,
            endcap,
            seed_endcap,
        }
    }

    /// General (cluster membership) threshold for a layer.
    #[inline]
    #[must_use]
    pub fn cell(&self, layer: Layer) -> f64 {
        match layer.region() {
            Region::Barrel => self.barrel,
            Region::Endcap => self.endcap,
        }
    }

    /// Seed threshold for a layer.
    #[inline]
    #[must_use]
    pub fn seed(&self, layer: Layer) -> f64 {
        match layer.region() {
            Region::Barrel => self.seed_barrel,
            Region::Endcap => self.seed_endcap,
        }
    }
}

/// Neighbour graph used to grow topo-clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Connectivity {
    /// Edge-sharing neighbours only.
    Four,
    /// Edge- and corner-sharing neighbours.
    #[default]
    Eight,
}

impl Connectivity {
    /// Maps a neighbour count (4 or 8) to a connectivity.
    #[must_use]
    pub fn from_count(count: i64) -> Option<Self> {
        match count {
            4 => Some(Connectivity::Four),
            8 => Some(Connectivity::Eight),
            _ => None,
        }
    }
}

/// Distance used by the fractional splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceMetric {
    /// Euclidean distance between cartesian positions.
    #[default]
    Physical,
    /// Distance in the (eta, phi) plane.
    Angular,
}

/// Member cells entering the position calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PositionCells {
    /// Every member cell.
    #[default]
    All,
    /// The seed and its 4-neighbours.
    Neighbours4,
    /// The seed and its 8-neighbours.
    Neighbours8,
    /// The `n` members with the largest fractional energy.
    MostEnergetic(usize),
}

impl PositionCells {
    /// Maps a crystal count option (`-1`, `5`, `9` or any positive count).
    #[must_use]
    pub fn from_n_crystal(n: i64) -> Option<Self> {
        match n {
            -1 => Some(PositionCells::All),
            5 => Some(PositionCells::Neighbours4),
            9 => Some(PositionCells::Neighbours8),
            n if n > 0 => usize::try_from(n).ok().map(PositionCells::MostEnergetic),
            _ => None,
        }
    }
}

/// Shower-depth correction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepthCorrectionMode {
    /// No correction.
    #[default]
    Off,
    /// Electromagnetic showers: `depth = A * (B + ln E)`.
    Electromagnetic,
    /// Hadronic showers: `depth = A`.
    Hadronic,
}

impl DepthCorrectionMode {
    /// Maps a mode code (0, 1, 2).
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DepthCorrectionMode::Off),
            1 => Some(DepthCorrectionMode::Electromagnetic),
            2 => Some(DepthCorrectionMode::Hadronic),
            _ => None,
        }
    }
}

/// Depth-correction parameters.
///
/// The preshower coefficients apply to ECAL endcap clusters lying behind the
/// preshower.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthCorrection {
    /// Correction model.
    pub mode: DepthCorrectionMode,
    /// Coefficient A.
    pub a: f64,
    /// Coefficient B.
    pub b: f64,
    /// Coefficient A behind the preshower.
    pub a_preshower: f64,
    /// Coefficient B behind the preshower.
    pub b_preshower: f64,
}

impl Default for DepthCorrection {
    fn default() -> Self {
        Self {
            mode: DepthCorrectionMode::Off,
            a: -1.0,
            b: -1.0,
            a_preshower: -1.0,
            b_preshower: -1.0,
        }
    }
}

/// Fractional splitter iteration control.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitterConfig {
    /// Maximum number of fraction/position iterations.
    pub max_iterations: usize,
    /// Summed centroid shift below which iteration stops.
    pub tolerance: f64,
    /// Fractions below this value are dropped.
    pub min_fraction: f64,
    /// Distance, in shower sigmas, beyond which a cell gets no weight.
    pub max_sigma_distance: f64,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-3,
            min_fraction: 1e-9,
            max_sigma_distance: 10.0,
        }
    }
}

/// Configuration of one clustering engine instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringConfig {
    /// Cell and seed thresholds.
    pub thresholds: Thresholds,
    /// Transverse shower width used by the splitter.
    pub shower_sigma: f64,
    /// Neighbour graph for topo-cluster growth.
    pub connectivity: Connectivity,
    /// Distance used by the splitter.
    pub metric: DistanceMetric,
    /// Cells entering position calculation.
    pub position_cells: PositionCells,
    /// Position weighting parameter: `> 0` logarithmic cutoff, `0` linear,
    /// `< 0` logarithmic with the layer threshold as cutoff.
    pub pos_calc_p1: f64,
    /// Depth correction applied to final positions.
    pub depth_correction: DepthCorrection,
    /// Splitter iteration control.
    pub splitter: SplitterConfig,
    /// Emit per-topo-cluster debug traces.
    pub debug: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self::ecal_defaults()
    }
}

impl ClusteringConfig {
    /// ECAL defaults.
    #[must_use]
    pub fn ecal_defaults() -> Self {
        Self {
            thresholds: Thresholds::new(0.1, 0.3, 0.2, 0.8),
            shower_sigma: 3.0,
            connectivity: Connectivity::Eight,
            metric: DistanceMetric::Physical,
            position_cells: PositionCells::All,
            pos_calc_p1: -1.0,
            depth_correction: DepthCorrection::default(),
            splitter: SplitterConfig::default(),
            debug: false,
        }
    }

    /// HCAL defaults.
    #[must_use]
    pub fn hcal_defaults() -> Self {
        Self {
            thresholds: Thresholds::new(0.8, 1.4, 0.8, 1.4),
            shower_sigma: 15.0,
            position_cells: PositionCells::Neighbours4,
            pos_calc_p1: 1.0,
            ..Self::ecal_defaults()
        }
    }

    /// Preshower defaults.
    #[must_use]
    pub fn preshower_defaults() -> Self {
        Self {
            thresholds: Thresholds::new(0.0001, 0.001, 0.0001, 0.001),
            shower_sigma: 0.1,
            position_cells: PositionCells::All,
            pos_calc_p1: 0.0,
            ..Self::ecal_defaults()
        }
    }

    /// Defaults for a subsystem.
    #[must_use]
    pub fn defaults_for(subsystem: Subsystem) -> Self {
        match subsystem {
            Subsystem::Ecal => Self::ecal_defaults(),
            Subsystem::Hcal => Self::hcal_defaults(),
            Subsystem::Preshower => Self::preshower_defaults(),
        }
    }

    /// Sets the thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the shower sigma.
    #[must_use]
    pub fn with_shower_sigma(mut self, sigma: f64) -> Self {
        self.shower_sigma = sigma;
        self
    }

    /// Sets the growth connectivity.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Sets the splitter distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the position cell selection.
    #[must_use]
    pub fn with_position_cells(mut self, cells: PositionCells) -> Self {
        self.position_cells = cells;
        self
    }

    /// Sets the position weighting parameter.
    #[must_use]
    pub fn with_pos_calc_p1(mut self, p1: f64) -> Self {
        self.pos_calc_p1 = p1;
        self
    }

    /// Sets the depth correction.
    #[must_use]
    pub fn with_depth_correction(mut self, depth: DepthCorrection) -> Self {
        self.depth_correction = depth;
        self
    }

    /// Sets the splitter iteration control.
    #[must_use]
    pub fn with_splitter(mut self, splitter: SplitterConfig) -> Self {
        self.splitter = splitter;
        self
    }

    /// Enables debug traces.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Logarithmic weighting cutoff for a layer, `None` for linear weighting.
    #[must_use]
    pub fn log_weight_cutoff(&self, layer: Layer) -> Option<f64> {
        if self.pos_calc_p1 > 0.0 {
            Some(self.pos_calc_p1)
        } else if self.pos_calc_p1 < 0.0 {
            let threshold = self.thresholds.cell(layer);
            (threshold > 0.0).then_some(threshold)
        } else {
            None
        }
    }

    /// Checks values the engine cannot work with.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if ![t.barrel, t.seed_barrel, t.endcap, t.seed_endcap]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(Error::InvalidConfig("thresholds must be finite".into()));
        }
        if !(self.shower_sigma.is_finite() && self.shower_sigma > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "shower sigma must be positive, got {}",
                self.shower_sigma
            )));
        }
        if !self.pos_calc_p1.is_finite() {
            return Err(Error::InvalidConfig("posCalcP1 must be finite".into()));
        }
        if self.splitter.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "splitter needs at least one iteration".into(),
            ));
        }
        if !(self.splitter.tolerance > 0.0 && self.splitter.min_fraction >= 0.0) {
            return Err(Error::InvalidConfig(
                "splitter tolerance must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Run-wide configuration for the three subsystems.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconstructionConfig {
    /// ECAL engine configuration.
    pub ecal: ClusteringConfig,
    /// HCAL engine configuration.
    pub hcal: ClusteringConfig,
    /// Preshower engine configuration.
    pub preshower: ClusteringConfig,
    /// Run clustering at all.
    pub clustering_on: bool,
    /// Resolve declared neighbour ids when loading cells.
    pub find_neighbours: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            ecal: ClusteringConfig::ecal_defaults(),
            hcal: ClusteringConfig::hcal_defaults(),
            preshower: ClusteringConfig::preshower_defaults(),
            clustering_on: true,
            find_neighbours: true,
        }
    }
}

impl ReconstructionConfig {
    /// Configuration of one subsystem.
    #[must_use]
    pub fn config_for(&self, subsystem: Subsystem) -> &ClusteringConfig {
        match subsystem {
            Subsystem::Ecal => &self.ecal,
            Subsystem::Hcal => &self.hcal,
            Subsystem::Preshower => &self.preshower,
        }
    }

    /// Applies one depth correction to all subsystems.
    #[must_use]
    pub fn with_depth_correction(mut self, depth: DepthCorrection) -> Self {
        self.ecal.depth_correction = depth;
        self.hcal.depth_correction = depth;
        self.preshower.depth_correction = depth;
        self
    }
}

/// Counters collected by one clustering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Cells loaded into the registry.
    pub cells_loaded: usize,
    /// Records skipped for a repeated detector id.
    pub duplicates_skipped: usize,
    /// Declared neighbour ids with no cell in the event.
    pub neighbours_dropped: usize,
    /// Seeds selected.
    pub seeds_found: usize,
    /// Topo-clusters grown.
    pub topo_clusters: usize,
    /// Topo-clusters with more than one seed.
    pub split_topo_clusters: usize,
    /// Splitter iterations, summed over topo-clusters.
    pub split_iterations: usize,
    /// Topo-clusters whose splitting hit the iteration limit.
    pub non_converged: usize,
    /// Final clusters produced.
    pub clusters_found: usize,
}

impl ClusteringStatistics {
    /// Adds another run's counters to these.
    pub fn merge(&mut self, other: &Self) {
        self.cells_loaded += other.cells_loaded;
        self.duplicates_skipped += other.duplicates_skipped;
        self.neighbours_dropped += other.neighbours_dropped;
        self.seeds_found += other.seeds_found;
        self.topo_clusters += other.topo_clusters;
        self.split_topo_clusters += other.split_topo_clusters;
        self.split_iterations += other.split_iterations;
        self.non_converged += other.non_converged;
        self.clusters_found += other.clusters_found;
    }
}
