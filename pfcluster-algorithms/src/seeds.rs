//! Seed selection: local energy maxima above the seed threshold.
#![allow(clippy::float_cmp)]

use pfcluster_core::{Cell, Thresholds};

/// Seeds of one event: a flag per cell and the seed indices in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSet {
    flags: Vec<bool>,
    indices: Vec<usize>,
}

impl SeedSet {
    /// Returns true if cell `index` is a seed.
    #[inline]
    #[must_use]
    pub fn is_seed(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    /// Seed indices, increasing.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// One flag per cell.
    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Number of seeds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no cell is a seed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Consumes the set, returning the per-cell flags.
    #[must_use]
    pub fn into_flags(self) -> Vec<bool> {
        self.flags
    }
}

/// Marks seeds among `cells`.
///
/// Cell `i` is a seed when its energy reaches the seed threshold of its layer
/// and no 8-neighbour outranks it. A neighbour outranks `i` if it has more
/// energy, or equal energy and a lower index, so of two adjacent equal maxima
/// only the earlier one is kept.
#[must_use]
pub fn find_seeds(cells: &[Cell], thresholds: &Thresholds) -> SeedSet {
    let mut flags = vec![false; cells.len()];
    let mut indices = Vec::new();

    for (i, cell) in cells.iter().enumerate() {
        if cell.energy < thresholds.seed(cell.layer) {
            continue;
        }
        let outranked = cell.neighbours8.iter().any(|&j| {
            let other = cells[j].energy;
            other > cell.energy || (other == cell.energy && j < i)
        });
        if !outranked {
            flags[i] = true;
            indices.push(i);
        }
    }

    SeedSet { flags, indices }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    use super::*;
    use pfcluster_core::{Layer, Point3};

    fn row(energies: &[f64], layer: Layer) -> Vec<Cell> {
        let n = energies.len();
        energies
            .iter()
            .enumerate()
            .map(|(i, &energy)| {
                let mut neighbours = Vec::new();
                if i > 0 {
                    neighbours.push(i - 1);
                }
                if i + 1 < n {
                    neighbours.push(i + 1);
                }
                let x = i as f64;
                Cell {
                    detector_id: i as u32,
                    energy,
                    layer,
                    position: Point3::new(x, 0.0, 0.0),
                    eta_phi: Point3::new(x, 0.0, 0.0).eta_phi(),
                    corners: [Point3::ORIGIN; 4],
                    neighbours4: neighbours.clone(),
                    neighbours8: neighbours,
                }
            })
            .collect()
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(0.1, 0.3, 0.2, 0.8)
    }

    #[test]
    fn test_local_maxima_above_threshold() {
        let cells = row(&[0.5, 1.0, 0.4, 0.2, 0.6], Layer::EcalBarrel);
        let seeds = find_seeds(&cells, &thresholds());
        assert_eq!(seeds.indices(), &[1, 4]);
        assert!(seeds.is_seed(4));
        assert!(!seeds.is_seed(0));
    }

    #[test]
    fn test_seed_threshold_depends_on_region() {
        // 0.5 passes the barrel seed threshold but not the endcap one
        let barrel = row(&[0.5], Layer::EcalBarrel);
        let endcap = row(&[0.5], Layer::EcalEndcap);
        assert_eq!(find_seeds(&barrel, &thresholds()).len(), 1);
        assert!(find_seeds(&endcap, &thresholds()).is_empty());
    }

    #[test]
    fn test_equal_neighbours_keep_lower_index() {
        let cells = row(&[0.1, 2.0, 2.0, 0.1], Layer::EcalBarrel);
        let seeds = find_seeds(&cells, &thresholds());
        assert_eq!(seeds.indices(), &[1]);
    }

    #[test]
    fn test_empty_input() {
        let seeds = find_seeds(&[], &thresholds());
        assert!(seeds.is_empty());
        assert!(seeds.flags().is_empty());
    }
}
