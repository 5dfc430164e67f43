//! State vector of the Lagrangian scheme: position, velocity, energy.

use crate::error::{HydroError, Result};
use crate::space::{Discretization, FiniteElementSpace};
use crate::time::Integrable;

/// The three blocks advanced in time.
///
/// `x` and `v` live in the kinematic space (component-major), `e` in the
/// thermodynamic space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HydroState {
    /// Mesh node positions.
    pub x: Vec<f64>,
    /// Velocity.
    pub v: Vec<f64>,
    /// Specific internal energy.
    pub e: Vec<f64>,
}

impl HydroState {
    pub fn new(x: Vec<f64>, v: Vec<f64>, e: Vec<f64>) -> Self {
        Self { x, v, e }
    }

    /// Undeformed mesh at rest with zero energy.
    pub fn at_rest(disc: &Discretization) -> Self {
        Self {
            x: disc.initial_position(),
            v: vec![0.0; disc.h1.n_dofs()],
            e: vec![0.0; disc.l2.n_dofs()],
        }
    }

    /// Total length of the three blocks.
    pub fn len(&self) -> usize {
        self.x.len() + self.v.len() + self.e.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check block sizes against a discretization.
    pub fn check(&self, disc: &Discretization) -> Result<()> {
        for (what, expected, actual) in [
            ("position", disc.h1.n_dofs(), self.x.len()),
            ("velocity", disc.h1.n_dofs(), self.v.len()),
            ("energy", disc.l2.n_dofs(), self.e.len()),
        ] {
            if expected != actual {
                return Err(HydroError::size_mismatch(what, expected, actual));
            }
        }
        Ok(())
    }

    /// True if every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.x
            .iter()
            .chain(&self.v)
            .chain(&self.e)
            .all(|v| v.is_finite())
    }
}

impl Integrable for HydroState {
    fn scale(&mut self, c: f64) {
        self.x.scale(c);
        self.v.scale(c);
        self.e.scale(c);
    }

    fn axpy(&mut self, c: f64, other: &Self) {
        self.x.axpy(c, &other.x);
        self.v.axpy(c, &other.v);
        self.e.axpy(c, &other.e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh2D;

    #[test]
    fn test_at_rest_matches_discretization() {
        let disc = Discretization::new(Mesh2D::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 2, 3), 2, 1, None)
            .unwrap();
        let s = HydroState::at_rest(&disc);
        s.check(&disc).unwrap();
        assert_eq!(s.len(), 2 * disc.h1.n_dofs() + disc.l2.n_dofs());
        assert!(s.v.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_axpy_acts_on_every_block() {
        let mut a = HydroState::new(vec![1.0], vec![2.0, 3.0], vec![4.0]);
        let b = HydroState::new(vec![1.0], vec![1.0, 1.0], vec![1.0]);
        a.axpy(2.0, &b);
        assert_eq!(a, HydroState::new(vec![3.0], vec![4.0, 5.0], vec![6.0]));
        a.scale(0.5);
        assert_eq!(a.e, vec![3.0]);
    }

    #[test]
    fn test_check_reports_wrong_block() {
        let disc = Discretization::new(Mesh2D::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 1, 1), 1, 0, None)
            .unwrap();
        let mut s = HydroState::at_rest(&disc);
        s.e.push(0.0);
        assert!(matches!(
            s.check(&disc),
            Err(HydroError::SizeMismatch { what: "energy", .. })
        ));
    }
}
