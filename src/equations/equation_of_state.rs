//! Ideal-gas equation of state.
//!
//! p = (γ - 1) ρ e
//! c = sqrt(γ p / ρ) = sqrt(γ (γ - 1) e)
//!
//! Negative specific internal energies (which high-order schemes can produce
//! near strong shocks) are clamped to zero before evaluating either quantity.

use super::EquationOfState;

/// Polytropic ideal gas with adiabatic index γ.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdealGas {
    /// Adiabatic index
    pub gamma: f64,
}

impl Default for IdealGas {
    fn default() -> Self {
        Self::new(1.4)
    }
}

impl IdealGas {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }
}

impl EquationOfState for IdealGas {
    #[inline]
    fn pressure(&self, rho: f64, e: f64) -> f64 {
        (self.gamma - 1.0) * rho * e.max(0.0)
    }

    #[inline]
    fn sound_speed(&self, _rho: f64, e: f64) -> f64 {
        (self.gamma * (self.gamma - 1.0) * e.max(0.0)).sqrt()
    }
}
