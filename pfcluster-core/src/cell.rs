//! Calorimeter cells (rechits).

use std::fmt;

use crate::{EtaPhi, Layer, Point3, Subsystem};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw rechit record for one cell, as delivered by the event source.
///
/// Neighbours are declared by detector id. Ids with no matching cell in the
/// event are dropped when the record is loaded into a registry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellRecord {
    /// Detector id, unique within a subsystem.
    pub detector_id: u32,
    /// Measured energy.
    pub energy: f64,
    /// Detector layer.
    pub layer: Layer,
    /// Cell centre in cartesian coordinates.
    pub position: Point3,
    /// Cell centre in (eta, phi). Computed from `position` when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub eta_phi: Option<EtaPhi>,
    /// Front-face corners, for shape rendering.
    #[cfg_attr(feature = "serde", serde(default))]
    pub corners: [Point3; 4],
    /// Detector ids of the 4 edge-sharing neighbours.
    #[cfg_attr(feature = "serde", serde(default))]
    pub neighbours4: Vec<u32>,
    /// Detector ids of the 8 surrounding neighbours.
    #[cfg_attr(feature = "serde", serde(default))]
    pub neighbours8: Vec<u32>,
}

impl CellRecord {
    /// Creates a record with no corners and no declared neighbours.
    #[must_use]
    pub fn new(detector_id: u32, energy: f64, layer: Layer, position: Point3) -> Self {
        Self {
            detector_id,
            energy,
            layer,
            position,
            eta_phi: None,
            corners: [Point3::ORIGIN; 4],
            neighbours4: Vec::new(),
            neighbours8: Vec::new(),
        }
    }

    /// Sets the declared neighbour ids.
    #[must_use]
    pub fn with_neighbours(mut self, neighbours4: Vec<u32>, neighbours8: Vec<u32>) -> Self {
        self.neighbours4 = neighbours4;
        self.neighbours8 = neighbours8;
        self
    }

    /// Sets the angular position explicitly.
    #[must_use]
    pub fn with_eta_phi(mut self, eta_phi: EtaPhi) -> Self {
        self.eta_phi = Some(eta_phi);
        self
    }
}

/// A cell loaded into a registry, with neighbours resolved to indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Detector id.
    pub detector_id: u32,
    /// Measured energy.
    pub energy: f64,
    /// Detector layer.
    pub layer: Layer,
    /// Cell centre in cartesian coordinates.
    pub position: Point3,
    /// Cell centre in (eta, phi).
    pub eta_phi: EtaPhi,
    /// Front-face corners.
    pub corners: [Point3; 4],
    /// Registry indices of the 4-neighbours present in the event.
    pub neighbours4: Vec<usize>,
    /// Registry indices of the 8-neighbours present in the event.
    pub neighbours8: Vec<usize>,
}

impl Cell {
    /// Builds an unlinked cell from a record.
    #[must_use]
    pub fn from_record(record: &CellRecord) -> Self {
        Self {
            detector_id: record.detector_id,
            energy: record.energy,
            layer: record.layer,
            position: record.position,
            eta_phi: record.eta_phi.unwrap_or_else(|| record.position.eta_phi()),
            corners: record.corners,
            neighbours4: Vec::new(),
            neighbours8: Vec::new(),
        }
    }

    /// Returns true if `index` is one of this cell's 4-neighbours.
    #[inline]
    #[must_use]
    pub fn is_neighbour4(&self, index: usize) -> bool {
        self.neighbours4.contains(&index)
    }

    /// Returns true if `index` is one of this cell's 8-neighbours.
    #[inline]
    #[must_use]
    pub fn is_neighbour8(&self, index: usize) -> bool {
        self.neighbours8.contains(&index)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rechit detid {} layer {} E {:.4} eta {:.4} phi {:.4} xyz ({:.2}, {:.2}, {:.2}) n4 {} n8 {}",
            self.detector_id,
            self.layer,
            self.energy,
            self.eta_phi.eta,
            self.eta_phi.phi,
            self.position.x,
            self.position.y,
            self.position.z,
            self.neighbours4.len(),
            self.neighbours8.len()
        )
    }
}

/// Rechit records of one event, per subsystem.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRecords {
    /// Event number, if the source provides one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub event: Option<u64>,
    /// ECAL rechits.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ecal: Vec<CellRecord>,
    /// HCAL rechits.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hcal: Vec<CellRecord>,
    /// Preshower rechits.
    #[cfg_attr(feature = "serde", serde(default))]
    pub preshower: Vec<CellRecord>,
}

impl EventRecords {
    /// Records of one subsystem.
    #[must_use]
    pub fn records(&self, subsystem: Subsystem) -> &[CellRecord] {
        match subsystem {
            Subsystem::Ecal => &self.ecal,
            Subsystem::Hcal => &self.hcal,
            Subsystem::Preshower => &self.preshower,
        }
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ecal.len() + self.hcal.len() + self.preshower.len()
    }

    /// Returns true if the event has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
