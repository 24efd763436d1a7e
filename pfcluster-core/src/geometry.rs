//! Cartesian and angular positions.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pseudorapidity reported for points on the beam axis.
const AXIS_ETA: f64 = 1.0e10;

/// Point (or vector) in detector cartesian coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (along the beam).
    pub z: f64,
}

impl Point3 {
    /// The origin.
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a new point.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Transverse distance from the beam axis.
    #[inline]
    #[must_use]
    pub fn rho(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Distance from the origin.
    #[inline]
    #[must_use]
    pub fn mag(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Azimuthal angle in `(-pi, pi]`.
    #[inline]
    #[must_use]
    pub fn phi(&self) -> f64 {
        if self.x == 0.0 && self.y == 0.0 {
            0.0
        } else {
            self.y.atan2(self.x)
        }
    }

    /// Pseudorapidity.
    #[must_use]
    pub fn eta(&self) -> f64 {
        let rho = self.rho();
        if rho > 0.0 {
            (self.z / rho).asinh()
        } else if self.z == 0.0 {
            0.0
        } else {
            AXIS_ETA.copysign(self.z)
        }
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).mag()
    }

    /// Unit vector along this one, or the zero vector.
    #[must_use]
    pub fn unit(&self) -> Self {
        let mag = self.mag();
        if mag > 0.0 {
            *self * (1.0 / mag)
        } else {
            Self::ORIGIN
        }
    }

    /// Angular representation of this point.
    #[inline]
    #[must_use]
    pub fn eta_phi(&self) -> EtaPhi {
        EtaPhi::new(self.eta(), self.phi())
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Angular position: pseudorapidity and azimuth.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EtaPhi {
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
}

impl EtaPhi {
    /// Creates a new angular position.
    #[inline]
    #[must_use]
    pub fn new(eta: f64, phi: f64) -> Self {
        Self { eta, phi }
    }

    /// Distance in the (eta, phi) plane, with phi wrapped to `[-pi, pi]`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        let deta = self.eta - other.eta;
        let dphi = delta_phi(self.phi, other.phi);
        deta.hypot(dphi)
    }
}

/// Difference of two azimuthal angles, wrapped to `[-pi, pi]`.
#[must_use]
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut dphi = phi1 - phi2;
    while dphi > PI {
        dphi -= 2.0 * PI;
    }
    while dphi < -PI {
        dphi += 2.0 * PI;
    }
    dphi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_point_eta_phi() {
        let p = Point3::new(0.0, 129.0, 0.0);
        assert_abs_diff_eq!(p.eta(), 0.0);
        assert_abs_diff_eq!(p.phi(), PI / 2.0);

        // eta = asinh(z / rho)
        let p = Point3::new(100.0, 0.0, 100.0);
        assert_abs_diff_eq!(p.eta(), 1.0_f64.asinh(), epsilon = 1e-12);
    }

    #[test]
    fn test_point_on_axis() {
        assert_abs_diff_eq!(Point3::ORIGIN.eta(), 0.0);
        assert!(Point3::new(0.0, 0.0, 300.0).eta() > 1.0e9);
        assert!(Point3::new(0.0, 0.0, -300.0).eta() < -1.0e9);
    }

    #[test]
    fn test_point_arithmetic() {
        let a = Point3::new(1.0, 2.0, 2.0);
        assert_abs_diff_eq!(a.mag(), 3.0);
        assert_abs_diff_eq!(a.unit().mag(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.distance(&Point3::ORIGIN), 3.0);
        let b = a + a * 2.0 - a;
        assert_eq!(b, Point3::new(2.0, 4.0, 4.0));
        assert_eq!(Point3::ORIGIN.unit(), Point3::ORIGIN);
    }

    #[test]
    fn test_delta_phi_wraps() {
        let a = EtaPhi::new(0.0, PI - 0.1);
        let b = EtaPhi::new(0.0, -PI + 0.1);
        assert_abs_diff_eq!(a.distance(&b), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(delta_phi(0.3, 0.1), 0.2, epsilon = 1e-12);
    }
}
