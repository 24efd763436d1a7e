//! Cluster energy, position and shower-depth correction.
//!
//! Everything here is a pure function of the member cells and their
//! fractions, so recalculating an unchanged cluster gives the same result.

use pfcluster_core::{
    Cell, CellFraction, Cluster, ClusterCollection, ClusteringConfig, DepthCorrection,
    DepthCorrectionMode, Layer, Point3, PositionCells,
};

/// Fractions below this carry no position weight.
const MIN_WEIGHTED_FRACTION: f64 = 1e-9;

/// Weight sums below this fall back to the most energetic cell.
const MIN_NORMALIZATION: f64 = 1e-9;

/// |eta| range of ECAL covered by the preshower.
const PRESHOWER_ETA_MIN: f64 = 1.65;
const PRESHOWER_ETA_MAX: f64 = 2.6;

/// Computes cluster energies and positions for one engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct PositionCalculator<'a> {
    config: &'a ClusteringConfig,
}

impl<'a> PositionCalculator<'a> {
    /// Creates a calculator bound to a configuration.
    #[must_use]
    pub fn new(config: &'a ClusteringConfig) -> Self {
        Self { config }
    }

    /// Fraction-weighted energy of the members.
    #[must_use]
    pub fn energy(cells: &[Cell], fractions: &[CellFraction]) -> f64 {
        fractions
            .iter()
            .map(|f| cells[f.cell].energy * f.fraction)
            .sum()
    }

    /// Weighted centroid of the members, without depth correction.
    ///
    /// Members are first restricted according to the position cell
    /// selection, relative to `seed`. Weights are linear in the fractional
    /// energy or logarithmic above a cutoff, depending on `posCalcP1`. When
    /// no member carries weight the most energetic member's position is
    /// returned; with no members at all, the seed's.
    #[must_use]
    pub fn centroid(&self, cells: &[Cell], fractions: &[CellFraction], seed: usize) -> Point3 {
        let selected = self.select(cells, fractions, seed);
        let cutoff = self.config.log_weight_cutoff(cells[seed].layer);

        let mut sum = Point3::ORIGIN;
        let mut normalization = 0.0;
        let mut max_energy = f64::NEG_INFINITY;
        let mut fallback = cells[seed].position;

        for f in selected {
            let cell = &cells[f.cell];
            let energy = cell.energy * f.fraction;
            if energy > max_energy {
                max_energy = energy;
                fallback = cell.position;
            }
            let weight = match cutoff {
                Some(_) if f.fraction < MIN_WEIGHTED_FRACTION => 0.0,
                Some(p1) => (energy / p1).ln().max(0.0),
                None => energy.max(0.0),
            };
            sum = sum + cell.position * weight;
            normalization += weight;
        }

        if normalization < MIN_NORMALIZATION {
            fallback
        } else {
            sum * (1.0 / normalization)
        }
    }

    fn select(&self, cells: &[Cell], fractions: &[CellFraction], seed: usize) -> Vec<CellFraction> {
        let seed_cell = &cells[seed];
        match self.config.position_cells {
            PositionCells::All => fractions.to_vec(),
            PositionCells::Neighbours4 => fractions
                .iter()
                .copied()
                .filter(|f| {
                    f.cell == seed
                        || seed_cell.is_neighbour4(f.cell)
                        || cells[f.cell].is_neighbour4(seed)
                })
                .collect(),
            PositionCells::Neighbours8 => fractions
                .iter()
                .copied()
                .filter(|f| {
                    f.cell == seed
                        || seed_cell.is_neighbour8(f.cell)
                        || cells[f.cell].is_neighbour8(seed)
                })
                .collect(),
            PositionCells::MostEnergetic(n) => {
                let mut ranked = fractions.to_vec();
                ranked.sort_by(|a, b| {
                    let ea = cells[a.cell].energy * a.fraction;
                    let eb = cells[b.cell].energy * b.fraction;
                    eb.total_cmp(&ea).then(a.cell.cmp(&b.cell))
                });
                ranked.truncate(n);
                ranked
            }
        }
    }

    /// Recomputes energy, positions and depth-corrected position of a cluster.
    pub fn update(&self, cluster: &mut Cluster, cells: &[Cell]) {
        cluster.energy = Self::energy(cells, &cluster.fractions);
        cluster.position = self.centroid(cells, &cluster.fractions, cluster.seed);
        cluster.eta_phi = cluster.position.eta_phi();
        cluster.depth_corrected = depth_corrected(
            cluster.position,
            cluster.energy,
            cluster.layer,
            &self.config.depth_correction,
        );
    }

    /// Recomputes every cluster of a collection.
    pub fn update_all(&self, collection: &mut ClusterCollection, cells: &[Cell]) {
        for cluster in collection.iter_mut() {
            self.update(cluster, cells);
        }
    }
}

/// Shifts an ECAL cluster position along its direction by the shower depth.
///
/// Other layers, and a disabled correction, leave the position unchanged.
/// Clusters behind the preshower use the preshower coefficients.
#[must_use]
pub fn depth_corrected(
    position: Point3,
    energy: f64,
    layer: Layer,
    depth: &DepthCorrection,
) -> Point3 {
    if depth.mode == DepthCorrectionMode::Off || !layer.is_ecal() {
        return position;
    }

    let abs_eta = position.eta().abs();
    let (a, b) = if abs_eta > PRESHOWER_ETA_MIN && abs_eta < PRESHOWER_ETA_MAX {
        (depth.a_preshower, depth.b_preshower)
    } else {
        (depth.a, depth.b)
    };

    let shift = match depth.mode {
        DepthCorrectionMode::Off => 0.0,
        DepthCorrectionMode::Electromagnetic if energy > 0.0 => a * (b + energy.ln()),
        DepthCorrectionMode::Electromagnetic => 0.0,
        DepthCorrectionMode::Hadronic => a,
    };

    position + position.unit() * shift
}

#[cfg(test)]
mod tests {
    #![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    use super::*;
    use approx::assert_abs_diff_eq;
    use pfcluster_core::{ClusterType, Layer};

    fn cells(specs: &[(f64, f64)]) -> Vec<Cell> {
        let n = specs.len();
        specs
            .iter()
            .enumerate()
            .map(|(i, &(x, energy))| {
                let position = Point3::new(x, 129.0, 0.0);
                let mut links = Vec::new();
                if i > 0 {
                    links.push(i - 1);
                }
                if i + 1 < n {
                    links.push(i + 1);
                }
                Cell {
                    detector_id: i as u32,
                    energy,
                    layer: Layer::EcalBarrel,
                    position,
                    eta_phi: position.eta_phi(),
                    corners: [Point3::ORIGIN; 4],
                    neighbours4: links.clone(),
                    neighbours8: links,
                }
            })
            .collect()
    }

    fn all(n: usize) -> Vec<CellFraction> {
        (0..n).map(|i| CellFraction::new(i, 1.0)).collect()
    }

    #[test]
    fn test_linear_centroid() {
        let cells = cells(&[(0.0, 3.0), (2.0, 1.0)]);
        let config = ClusteringConfig::ecal_defaults().with_pos_calc_p1(0.0);
        let calc = PositionCalculator::new(&config);
        let centroid = calc.centroid(&cells, &all(2), 0);
        assert_abs_diff_eq!(centroid.x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(centroid.y, 129.0, epsilon = 1e-12);
    }

    #[test]
    fn test_log_weighted_centroid() {
        let cells = cells(&[(0.0, 4.0), (2.0, 2.0), (4.0, 0.5)]);
        let config = ClusteringConfig::ecal_defaults().with_pos_calc_p1(1.0);
        let calc = PositionCalculator::new(&config);
        // weights ln 4, ln 2, 0
        let expected = 2.0 * 2.0_f64.ln() / (4.0_f64.ln() + 2.0_f64.ln());
        assert_abs_diff_eq!(calc.centroid(&cells, &all(3), 0).x, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_all_weights_vanish_uses_most_energetic() {
        let cells = cells(&[(0.0, 0.5), (2.0, 0.8)]);
        let config = ClusteringConfig::ecal_defaults().with_pos_calc_p1(1.0);
        let calc = PositionCalculator::new(&config);
        assert_abs_diff_eq!(calc.centroid(&cells, &all(2), 0).x, 2.0);
    }

    #[test]
    fn test_position_cell_restriction() {
        let cells = cells(&[(0.0, 1.0), (2.0, 1.0), (4.0, 1.0)]);
        let config = ClusteringConfig::ecal_defaults()
            .with_pos_calc_p1(0.0)
            .with_position_cells(PositionCells::Neighbours4);
        let calc = PositionCalculator::new(&config);
        // cell 2 is not adjacent to seed 0
        assert_abs_diff_eq!(calc.centroid(&cells, &all(3), 0).x, 1.0, epsilon = 1e-12);

        let config = config.with_position_cells(PositionCells::MostEnergetic(1));
        let calc = PositionCalculator::new(&config);
        // equal energies: lowest index first
        assert_abs_diff_eq!(calc.centroid(&cells, &all(3), 1).x, 0.0);
    }

    #[test]
    fn test_update_is_idempotent() {
        let cells = cells(&[(0.0, 3.0), (2.0, 1.0), (4.0, 0.4)]);
        let depth = DepthCorrection {
            mode: DepthCorrectionMode::Electromagnetic,
            a: 0.89,
            b: 7.3,
            a_preshower: 0.89,
            b_preshower: 4.0,
        };
        let config = ClusteringConfig::ecal_defaults().with_depth_correction(depth);
        let calc = PositionCalculator::new(&config);
        let mut cluster = Cluster::new(0, ClusterType::Topological, Layer::EcalBarrel, 0, all(3));

        calc.update(&mut cluster, &cells);
        let first = cluster.clone();
        calc.update(&mut cluster, &cells);
        assert_eq!(first, cluster);
        assert_abs_diff_eq!(cluster.energy, 4.4, epsilon = 1e-12);
    }

    #[test]
    fn test_depth_correction_modes() {
        let position = Point3::new(0.0, 129.0, 0.0);
        let mut depth = DepthCorrection::default();
        assert_eq!(depth_corrected(position, 10.0, Layer::EcalBarrel, &depth), position);

        depth.mode = DepthCorrectionMode::Hadronic;
        depth.a = 5.0;
        let shifted = depth_corrected(position, 10.0, Layer::EcalBarrel, &depth);
        assert_abs_diff_eq!(shifted.y, 134.0, epsilon = 1e-12);
        // not ECAL: untouched
        assert_eq!(depth_corrected(position, 10.0, Layer::HcalBarrel1, &depth), position);

        depth.mode = DepthCorrectionMode::Electromagnetic;
        depth.a = 1.0;
        depth.b = 2.0;
        let shifted = depth_corrected(position, 1.0, Layer::EcalBarrel, &depth);
        assert_abs_diff_eq!(shifted.y, 131.0, epsilon = 1e-12);
        assert_eq!(depth_corrected(position, 0.0, Layer::EcalBarrel, &depth), position);
    }

    #[test]
    fn test_depth_correction_behind_preshower() {
        // |eta| = 2.0
        let z = 129.0 * 2.0_f64.sinh();
        let position = Point3::new(129.0, 0.0, z);
        let depth = DepthCorrection {
            mode: DepthCorrectionMode::Hadronic,
            a: 1.0,
            b: 0.0,
            a_preshower: 3.0,
            b_preshower: 0.0,
        };
        let shifted = depth_corrected(position, 5.0, Layer::EcalEndcap, &depth);
        assert_abs_diff_eq!(shifted.mag() - position.mag(), 3.0, epsilon = 1e-9);
    }
}
