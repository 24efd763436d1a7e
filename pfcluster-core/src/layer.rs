//! Calorimeter layers and subsystems.

use std::fmt;

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Detector layer a cell or cluster belongs to.
///
/// The integer codes are the ones used by upstream rechit producers:
/// negative codes for the electromagnetic side, positive for hadronic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
pub enum Layer {
    /// Preshower, second plane.
    Preshower2,
    /// Preshower, first plane.
    Preshower1,
    /// ECAL endcap crystals.
    EcalEndcap,
    /// ECAL barrel crystals.
    EcalBarrel,
    /// HCAL barrel, first depth.
    HcalBarrel1,
    /// HCAL barrel, second depth.
    HcalBarrel2,
    /// HCAL endcap towers.
    HcalEndcap,
    /// Very forward calorimeter.
    Vfcal,
}

/// Barrel or endcap, used to select threshold families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Region {
    /// Central barrel layers.
    Barrel,
    /// Endcap, preshower and forward layers.
    Endcap,
}

/// Calorimeter subsystem. Each is clustered independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Subsystem {
    /// Electromagnetic calorimeter.
    Ecal,
    /// Hadronic calorimeter.
    Hcal,
    /// Preshower detector.
    Preshower,
}

impl Layer {
    /// All layers, in code order.
    pub const ALL: [Layer; 8] = [
        Layer::Preshower2,
        Layer::Preshower1,
        Layer::EcalEndcap,
        Layer::EcalBarrel,
        Layer::HcalBarrel1,
        Layer::HcalBarrel2,
        Layer::HcalEndcap,
        Layer::Vfcal,
    ];

    /// Returns the integer layer code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Layer::Preshower2 => -12,
            Layer::Preshower1 => -11,
            Layer::EcalEndcap => -2,
            Layer::EcalBarrel => -1,
            Layer::HcalBarrel1 => 1,
            Layer::HcalBarrel2 => 2,
            Layer::HcalEndcap => 3,
            Layer::Vfcal => 11,
        }
    }

    /// Returns the threshold region of this layer.
    ///
    /// Preshower planes sit in front of the endcaps and use endcap thresholds.
    #[must_use]
    pub fn region(self) -> Region {
        match self {
            Layer::EcalBarrel | Layer::HcalBarrel1 | Layer::HcalBarrel2 => Region::Barrel,
            Layer::EcalEndcap
            | Layer::HcalEndcap
            | Layer::Vfcal
            | Layer::Preshower1
            | Layer::Preshower2 => Region::Endcap,
        }
    }

    /// Returns the subsystem this layer is read out by.
    #[must_use]
    pub fn subsystem(self) -> Subsystem {
        match self {
            Layer::Preshower1 | Layer::Preshower2 => Subsystem::Preshower,
            Layer::EcalBarrel | Layer::EcalEndcap => Subsystem::Ecal,
            Layer::HcalBarrel1 | Layer::HcalBarrel2 | Layer::HcalEndcap | Layer::Vfcal => {
                Subsystem::Hcal
            }
        }
    }

    /// Returns true for the preshower planes.
    #[inline]
    #[must_use]
    pub fn is_preshower(self) -> bool {
        self.subsystem() == Subsystem::Preshower
    }

    /// Returns true for the ECAL layers.
    #[inline]
    #[must_use]
    pub fn is_ecal(self) -> bool {
        self.subsystem() == Subsystem::Ecal
    }
}

impl TryFrom<i32> for Layer {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        Layer::ALL
            .into_iter()
            .find(|layer| layer.code() == code)
            .ok_or(Error::UnknownLayer(code))
    }
}

impl From<Layer> for i32 {
    fn from(layer: Layer) -> Self {
        layer.code()
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Preshower2 => "PS2",
            Layer::Preshower1 => "PS1",
            Layer::EcalEndcap => "ECAL_ENDCAP",
            Layer::EcalBarrel => "ECAL_BARREL",
            Layer::HcalBarrel1 => "HCAL_BARREL1",
            Layer::HcalBarrel2 => "HCAL_BARREL2",
            Layer::HcalEndcap => "HCAL_ENDCAP",
            Layer::Vfcal => "VFCAL",
        };
        f.write_str(name)
    }
}

impl Subsystem {
    /// All subsystems in processing order.
    pub const ALL: [Subsystem; 3] = [Subsystem::Ecal, Subsystem::Hcal, Subsystem::Preshower];
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsystem::Ecal => "ECAL",
            Subsystem::Hcal => "HCAL",
            Subsystem::Preshower => "PS",
        };
        f.write_str(name)
    }
}
