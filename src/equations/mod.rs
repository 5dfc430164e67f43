//! Thermodynamic closure.
//!
//! The hydrodynamic system needs the pressure and sound speed as functions
//! of density and specific internal energy at every quadrature point.

mod equation_of_state;

pub use equation_of_state::IdealGas;

/// Equation of state p(ρ, e) with its sound speed.
pub trait EquationOfState: Clone + Send + Sync {
    /// Pressure.
    fn pressure(&self, rho: f64, e: f64) -> f64;

    /// Adiabatic sound speed.
    fn sound_speed(&self, rho: f64, e: f64) -> f64;
}
