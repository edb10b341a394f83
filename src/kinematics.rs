//! Four-vector arithmetic for invariant masses.
//!
//! Components are `(E, px, py, pz)` with the Minkowski metric `(+, -, -, -)`.

use std::iter::Sum;
use std::ops::Add;

/// Charged kaon mass in MeV
pub const KAON_MASS_MEV: f64 = 493.677;

/// Energy-momentum four-vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FourVector {
    /// Energy
    pub e: f64,
    /// x momentum
    pub px: f64,
    /// y momentum
    pub py: f64,
    /// z momentum
    pub pz: f64,
}

impl FourVector {
    /// From transverse momentum, pseudorapidity, azimuth and mass
    #[inline]
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        Self::from_momentum_mass(px, py, pz, mass)
    }

    /// From a momentum three-vector and an assumed mass
    #[inline]
    pub fn from_momentum_mass(px: f64, py: f64, pz: f64, mass: f64) -> Self {
        let e = (px * px + py * py + pz * pz + mass * mass).sqrt();
        Self { e, px, py, pz }
    }

    /// Squared three-momentum
    #[inline]
    pub fn p2(&self) -> f64 {
        self.px * self.px + self.py * self.py + self.pz * self.pz
    }

    /// Invariant mass, NaN for space-like vectors
    #[inline]
    pub fn mass(&self) -> f64 {
        (self.e * self.e - self.p2()).sqrt()
    }
}

impl Add for FourVector {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            e: self.e + rhs.e,
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
        }
    }
}

impl Sum for FourVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Invariant mass of particles given as parallel pt/eta/phi/mass slices
pub fn invariant_mass_pt_eta_phi_m(pt: &[f64], eta: &[f64], phi: &[f64], mass: &[f64]) -> f64 {
    pt.iter()
        .zip(eta)
        .zip(phi)
        .zip(mass)
        .map(|(((&pt, &eta), &phi), &m)| FourVector::from_pt_eta_phi_m(pt, eta, phi, m))
        .sum::<FourVector>()
        .mass()
}

/// Invariant mass of tracks given as parallel momentum slices, all with `mass`
pub fn invariant_mass_fixed(px: &[f64], py: &[f64], pz: &[f64], mass: f64) -> f64 {
    px.iter()
        .zip(py)
        .zip(pz)
        .map(|((&px, &py), &pz)| FourVector::from_momentum_mass(px, py, pz, mass))
        .sum::<FourVector>()
        .mass()
}
