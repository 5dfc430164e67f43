//! Named initial conditions.
//!
//! Each profile supplies the initial density, adiabatic index, velocity and
//! specific internal energy as functions of position, plus its default
//! domain, resolution, final time and whether artificial viscosity is on.

use std::f64::consts::PI;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{HydroError, Result};
use crate::hydro::{HydroState, PointFunction, QuadratureCache};
use crate::mesh::Mesh2D;
use crate::space::{Discretization, FiniteElementSpace};

/// Initial condition profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// Smooth vortex with a manufactured energy source.
    TaylorGreen,
    /// Point blast in a cold gas at rest.
    Sedov {
        blast_energy: f64,
        blast_position: [f64; 2],
    },
    /// Shock tube along x.
    Sod,
    /// Three-state interaction on [0, 7] × [0, 3].
    TriplePoint,
    /// Stationary vortex in pressure balance.
    Gresho,
    /// 2D Riemann problem with four contacts (configuration 5).
    Riemann5,
    /// 2D Riemann problem with four shear layers (configuration 6).
    Riemann6,
    /// Constant state at rest.
    Uniform {
        density: f64,
        energy: f64,
        gamma: f64,
    },
}

impl Default for Problem {
    fn default() -> Self {
        Problem::Sedov {
            blast_energy: 0.25,
            blast_position: [0.0, 0.0],
        }
    }
}

/// Quadrant of the unit square relative to (0.5, 0.5).
fn quadrant(x: [f64; 2]) -> (bool, bool) {
    (x[0] >= 0.5, x[1] >= 0.5)
}

/// Smooth taper vanishing on the unit square boundary.
fn riemann_taper(x: [f64; 2]) -> f64 {
    (16.0 * x[0] * (1.0 - x[0]) * x[1] * (1.0 - x[1]))
        .max(0.0)
        .powf(0.4)
}

impl Problem {
    pub fn name(&self) -> &'static str {
        match self {
            Problem::TaylorGreen => "taylor-green",
            Problem::Sedov { .. } => "sedov",
            Problem::Sod => "sod",
            Problem::TriplePoint => "triple-point",
            Problem::Gresho => "gresho",
            Problem::Riemann5 => "riemann-5",
            Problem::Riemann6 => "riemann-6",
            Problem::Uniform { .. } => "uniform",
        }
    }

    /// Domain bounds (x0, x1, y0, y1).
    pub fn domain(&self) -> (f64, f64, f64, f64) {
        match self {
            Problem::TriplePoint => (0.0, 7.0, 0.0, 3.0),
            Problem::Gresho => (-0.5, 0.5, -0.5, 0.5),
            _ => (0.0, 1.0, 0.0, 1.0),
        }
    }

    /// Default zones per direction.
    pub fn default_zones(&self) -> (usize, usize) {
        match self {
            Problem::TriplePoint => (14, 6),
            Problem::Sod => (16, 2),
            Problem::Uniform { .. } => (4, 4),
            _ => (8, 8),
        }
    }

    pub fn default_t_final(&self) -> f64 {
        match self {
            Problem::TaylorGreen => 0.5,
            Problem::Sedov { .. } => 0.8,
            Problem::Sod => 0.2,
            Problem::TriplePoint => 5.0,
            Problem::Gresho => 0.62,
            Problem::Riemann5 | Problem::Riemann6 => 0.3,
            Problem::Uniform { .. } => 0.1,
        }
    }

    /// Whether artificial viscosity is on by default.
    pub fn use_viscosity(&self) -> bool {
        !matches!(self, Problem::TaylorGreen | Problem::Gresho)
    }

    /// Initial mesh with `zones` per direction (problem default if `None`).
    pub fn mesh(&self, zones: Option<(usize, usize)>) -> Result<Mesh2D> {
        let (nx, ny) = zones.unwrap_or_else(|| self.default_zones());
        if nx == 0 || ny == 0 {
            return Err(HydroError::invalid_config(format!(
                "mesh needs at least one zone per direction, got {nx} x {ny}"
            )));
        }
        let (x0, x1, y0, y1) = self.domain();
        Ok(Mesh2D::uniform_rectangle(x0, x1, y0, y1, nx, ny))
    }

    pub fn rho0(&self, x: [f64; 2]) -> f64 {
        match self {
            Problem::TaylorGreen | Problem::Sedov { .. } | Problem::Gresho => 1.0,
            Problem::Sod => {
                if x[0] < 0.5 {
                    1.0
                } else {
                    0.1
                }
            }
            Problem::TriplePoint => {
                if x[0] > 1.0 && x[1] > 1.5 {
                    0.125
                } else {
                    1.0
                }
            }
            Problem::Riemann5 => match quadrant(x) {
                (true, true) => 0.5313,
                (false, false) => 0.8,
                _ => 1.0,
            },
            Problem::Riemann6 => match quadrant(x) {
                (false, true) => 2.0,
                (true, false) => 3.0,
                _ => 1.0,
            },
            Problem::Uniform { density, .. } => *density,
        }
    }

    pub fn gamma(&self, x: [f64; 2]) -> f64 {
        match self {
            Problem::TaylorGreen | Problem::Gresho => 5.0 / 3.0,
            Problem::TriplePoint => {
                if x[0] > 1.0 && x[1] <= 1.5 {
                    1.4
                } else {
                    1.5
                }
            }
            Problem::Uniform { gamma, .. } => *gamma,
            _ => 1.4,
        }
    }

    pub fn v0(&self, x: [f64; 2]) -> [f64; 2] {
        match self {
            Problem::TaylorGreen => [
                (PI * x[0]).sin() * (PI * x[1]).cos(),
                -(PI * x[0]).cos() * (PI * x[1]).sin(),
            ],
            Problem::Gresho => {
                let r = x[0].hypot(x[1]);
                if r < 0.2 {
                    [5.0 * x[1], -5.0 * x[0]]
                } else if r < 0.4 {
                    [2.0 * x[1] / r - 5.0 * x[1], -2.0 * x[0] / r + 5.0 * x[0]]
                } else {
                    [0.0, 0.0]
                }
            }
            Problem::Riemann5 => {
                let a = riemann_taper(x);
                match quadrant(x) {
                    (false, true) => [0.7276 * a, 0.0],
                    (true, false) => [0.0, 0.7276 * a],
                    _ => [0.0, 0.0],
                }
            }
            Problem::Riemann6 => {
                let a = riemann_taper(x);
                match quadrant(x) {
                    (true, true) => [0.75 * a, -0.5 * a],
                    (false, true) => [0.75 * a, 0.5 * a],
                    (false, false) => [-0.75 * a, 0.5 * a],
                    (true, false) => [-0.75 * a, -0.5 * a],
                }
            }
            _ => [0.0, 0.0],
        }
    }

    /// Specific internal energy. The Sedov blast is added separately.
    pub fn e0(&self, x: [f64; 2]) -> f64 {
        // e = p / ((γ - 1) ρ)
        let from_pressure = |p: f64| p / (self.rho0(x) * (self.gamma(x) - 1.0));
        match self {
            Problem::TaylorGreen => {
                (1.0 + ((2.0 * PI * x[0]).cos() + (2.0 * PI * x[1]).cos()) / 4.0) / (2.0 / 3.0)
            }
            Problem::Sedov { .. } => 0.0,
            Problem::Sod => from_pressure(if x[0] < 0.5 { 1.0 } else { 0.1 }),
            Problem::TriplePoint => from_pressure(if x[0] > 1.0 { 0.1 } else { 1.0 }),
            Problem::Gresho => {
                let gm1 = 5.0 / 3.0 - 1.0;
                let r = x[0].hypot(x[1]);
                let rsq = r * r;
                if r < 0.2 {
                    (5.0 + 12.5 * rsq) / gm1
                } else if r < 0.4 {
                    let t1 = 9.0 - 4.0 * 0.2f64.ln() + 12.5 * rsq;
                    let t2 = 20.0 * r - 4.0 * r.ln();
                    (t1 - t2) / gm1
                } else {
                    (3.0 + 4.0 * 2.0f64.ln()) / gm1
                }
            }
            Problem::Riemann5 => from_pressure(match quadrant(x) {
                (true, true) => 0.4,
                _ => 1.0,
            }),
            Problem::Riemann6 => from_pressure(1.0),
            Problem::Uniform { energy, .. } => *energy,
        }
    }

    /// Energy source of the manufactured Taylor-Green solution.
    pub fn energy_source(&self) -> Option<PointFunction> {
        match self {
            Problem::TaylorGreen => Some(Arc::new(|x: [f64; 2]| {
                3.0 / 8.0
                    * PI
                    * ((3.0 * PI * x[0]).cos() * (PI * x[1]).cos()
                        - (PI * x[0]).cos() * (3.0 * PI * x[1]).cos())
            })),
            _ => None,
        }
    }

    /// Quadrature cache with this problem's density and adiabatic index.
    pub fn quadrature_cache(
        &self,
        disc: &Discretization,
        x0: &[f64],
        use_viscosity: bool,
    ) -> Result<QuadratureCache> {
        QuadratureCache::new(
            disc,
            x0,
            |x| self.rho0(x),
            |x| self.gamma(x),
            use_viscosity,
        )
    }

    /// Initial state: nodal samples of v₀ and e₀, walls pinned.
    pub fn initial_state(&self, disc: &Discretization) -> Result<HydroState> {
        let x = disc.initial_position();
        let n = disc.h1.n_nodes();

        let mut v = vec![0.0; disc.h1.n_dofs()];
        for node in 0..n {
            let vn = self.v0([x[node], x[n + node]]);
            v[node] = vn[0];
            v[n + node] = vn[1];
        }
        disc.essential_dofs().zero_entries(&mut v);

        let mut e: Vec<f64> = disc
            .l2
            .node_coordinates(&disc.mesh)
            .into_iter()
            .map(|p| self.e0(p))
            .collect();

        if let Problem::Sedov {
            blast_energy,
            blast_position,
        } = self
        {
            deposit_blast(disc, &mut e, *blast_energy, *blast_position, |p| {
                self.rho0(p)
            })?;
        }

        Ok(HydroState::new(x, v, e))
    }
}

/// Put `energy` into the zone containing `position` as a constant specific
/// energy.
fn deposit_blast(
    disc: &Discretization,
    e: &mut [f64],
    energy: f64,
    position: [f64; 2],
    rho0: impl Fn([f64; 2]) -> f64,
) -> Result<()> {
    let zone = disc
        .mesh
        .zone_containing(position[0], position[1])
        .ok_or_else(|| {
            HydroError::invalid_config(format!(
                "blast position ({}, {}) lies outside the domain",
                position[0], position[1]
            ))
        })?;
    let (cx, cy) = disc.mesh.reference_to_physical(zone, 0.0, 0.0);
    let specific = energy / (rho0([cx, cy]) * disc.mesh.element_area(zone));
    for &d in disc.l2.zone_dofs(zone) {
        e[d] = specific;
    }
    log::debug!("Blast energy {energy} deposited in zone {zone}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sedov_deposit_holds_blast_energy() {
        let problem = Problem::default();
        let mesh = problem.mesh(Some((4, 4))).unwrap();
        let disc = Discretization::new(mesh, 2, 1, None).unwrap();
        let state = problem.initial_state(&disc).unwrap();

        let nonzero: Vec<_> = state.e.iter().filter(|&&e| e > 0.0).collect();
        assert_eq!(nonzero.len(), disc.l2.dofs_per_zone());
        // 0.25 / (1 · 1/16)
        assert_relative_eq!(*nonzero[0], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_blast_outside_domain_is_rejected() {
        let problem = Problem::Sedov {
            blast_energy: 1.0,
            blast_position: [2.0, 0.5],
        };
        let disc = Discretization::new(problem.mesh(Some((2, 2))).unwrap(), 1, 0, None).unwrap();
        assert!(matches!(
            problem.initial_state(&disc),
            Err(HydroError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_taylor_green_velocity_respects_walls() {
        let problem = Problem::TaylorGreen;
        let disc = Discretization::new(problem.mesh(Some((3, 3))).unwrap(), 2, 1, None).unwrap();
        let state = problem.initial_state(&disc).unwrap();
        for &d in disc.essential_dofs().as_slice() {
            assert_eq!(state.v[d], 0.0);
        }
        assert!(problem.energy_source().is_some());
        assert!(!problem.use_viscosity());
    }

    #[test]
    fn test_pressure_profiles() {
        let sod = Problem::Sod;
        let p = |x: [f64; 2]| (sod.gamma(x) - 1.0) * sod.rho0(x) * sod.e0(x);
        assert_relative_eq!(p([0.25, 0.5]), 1.0, epsilon = 1e-14);
        assert_relative_eq!(p([0.75, 0.5]), 0.1, epsilon = 1e-14);

        let tp = Problem::TriplePoint;
        let p = |x: [f64; 2]| (tp.gamma(x) - 1.0) * tp.rho0(x) * tp.e0(x);
        assert_relative_eq!(p([0.5, 1.0]), 1.0, epsilon = 1e-14);
        assert_relative_eq!(p([3.0, 2.0]), 0.1, epsilon = 1e-14);
    }

    #[test]
    fn test_gresho_energy_is_continuous() {
        let g = Problem::Gresho;
        let inner = g.e0([0.2 - 1e-9, 0.0]);
        let outer = g.e0([0.2 + 1e-9, 0.0]);
        assert_relative_eq!(inner, outer, epsilon = 1e-6);
        let inner = g.e0([0.4 - 1e-9, 0.0]);
        let outer = g.e0([0.4 + 1e-9, 0.0]);
        assert_relative_eq!(inner, outer, epsilon = 1e-6);
    }

    #[test]
    fn test_problem_toml_tag() {
        let text = toml::to_string(&Problem::default()).unwrap();
        assert!(text.contains("kind = \"sedov\""));
        let back: Problem = toml::from_str(&text).unwrap();
        assert_eq!(back, Problem::default());

        let riemann: Problem = toml::from_str("kind = \"riemann5\"").unwrap();
        assert_eq!(riemann, Problem::Riemann5);
    }
}
