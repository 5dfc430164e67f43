//! Right-hand side of the semi-discrete Lagrangian equations.
//!
//! For a state S = (x, v, e):
//!
//! ```text
//! dx/dt = v
//! M_v · dv/dt = −Fᵀ · 1
//! M_e · de/dt =  F · v  (+ energy source)
//! ```
//!
//! where F is the force operator assembled from the quadrature cache and the
//! mass matrices carry the time-independent weights ρ₀·det(J₀)·w. Both mass
//! solves use conjugate gradients on the matrix-free mass operators. With the
//! `parallel` feature the two solves run concurrently.

use std::sync::Arc;

use faer::{Mat, linalg::solvers::Solve};

use super::quadrature_data::QuadratureCache;
use super::state::HydroState;
use crate::comm::Communicator;
use crate::error::Result;
use crate::operators::{ConjugateGradient, ForceAssembler, MassOperator};
use crate::space::{Discretization, EssentialDofSet, FiniteElementSpace};
use crate::time::ExplicitOperator;

/// Scalar field sampled at physical points.
pub type PointFunction = Arc<dyn Fn([f64; 2]) -> f64 + Send + Sync>;

/// Freshness of the operator's quadrature cache.
///
/// The operator has no separate idle state: between calls it simply holds
/// a cache in one of these two states. A new operator starts `Stale`;
/// `mult`, `time_step_estimate` and `density` leave it `Fresh` for the
/// state they were given, and `invalidate` returns it to `Stale`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// Must be refreshed before the next use.
    Stale,
    /// Describes the state of the last call.
    Fresh,
}

/// Lagrangian hydrodynamics operator.
pub struct HydroOperator {
    disc: Discretization,
    cache: QuadratureCache,
    mass_v: MassOperator,
    mass_e: MassOperator,
    force: ForceAssembler,
    cg_v: ConjugateGradient,
    cg_e: ConjugateGradient,
    comm: Arc<dyn Communicator>,
    cfl: f64,
    source: Option<PointFunction>,
}

impl HydroOperator {
    /// Wire the operators to a discretization and its quadrature cache.
    ///
    /// Sets up both mass operators and pins the wall dofs of `disc`. This is
    /// a collective call.
    pub fn new(
        disc: Discretization,
        cache: QuadratureCache,
        comm: Arc<dyn Communicator>,
    ) -> Result<Self> {
        let ess = disc.essential_dofs();
        Self::with_essential_dofs(disc, cache, comm, &ess)
    }

    /// Like [`HydroOperator::new`] with an explicit set of pinned velocity dofs.
    pub fn with_essential_dofs(
        disc: Discretization,
        cache: QuadratureCache,
        comm: Arc<dyn Communicator>,
        ess: &EssentialDofSet,
    ) -> Result<Self> {
        let mut mass_v = MassOperator::new(&disc.h1, &disc.h1_shape);
        let mut mass_e = MassOperator::new(&disc.l2, &disc.l2_shape);
        mass_v.setup(&cache)?;
        mass_e.setup(&cache)?;
        mass_v.set_essential_dofs(ess, comm.as_ref())?;
        let force = ForceAssembler::new(&disc);

        log::debug!(
            "HydroOperator: {} pinned velocity dofs on rank {}",
            ess.len(),
            comm.rank()
        );

        Ok(Self {
            disc,
            cache,
            mass_v,
            mass_e,
            force,
            cg_v: ConjugateGradient::default(),
            cg_e: ConjugateGradient::default(),
            comm,
            cfl: 0.5,
            source: None,
        })
    }

    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// CG relative tolerance and iteration cap for both mass solves.
    pub fn with_solver(mut self, rel_tol: f64, max_iter: usize) -> Self {
        self.cg_v = ConjugateGradient::new(rel_tol, max_iter);
        self.cg_e = ConjugateGradient::new(rel_tol, max_iter);
        self
    }

    /// Specific energy source added to the energy equation.
    pub fn with_energy_source(mut self, source: PointFunction) -> Self {
        self.source = Some(source);
        self
    }

    pub fn discretization(&self) -> &Discretization {
        &self.disc
    }

    pub fn cache(&self) -> &QuadratureCache {
        &self.cache
    }

    pub fn cfl(&self) -> f64 {
        self.cfl
    }

    pub fn essential_dofs(&self) -> &EssentialDofSet {
        self.mass_v.essential_dofs()
    }

    pub fn communicator(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    pub fn cache_state(&self) -> CacheState {
        if self.cache.is_valid() {
            CacheState::Fresh
        } else {
            CacheState::Stale
        }
    }

    /// Forget the cached quadrature data.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    fn ensure_fresh(&mut self, state: &HydroState) -> Result<bool> {
        state.check(&self.disc)?;
        self.cache
            .ensure_fresh(&self.disc, &state.x, &state.v, &state.e)
    }

    /// dS/dt at `state`.
    pub fn mult(&mut self, state: &HydroState, _t: f64) -> Result<HydroState> {
        self.ensure_fresh(state)?;

        let (mut rhs_v, mut rhs_e) = {
            let force = self.force.assemble(&self.cache)?;
            let ones = vec![1.0; self.disc.l2.n_dofs()];
            let mut rhs_v = force.mult_transpose(&ones);
            for r in rhs_v.iter_mut() {
                *r = -*r;
            }
            (rhs_v, force.mult(&state.v))
        };

        if let Some(source) = &self.source {
            let s = self.force.assemble_source(&self.cache, |x| source(x))?;
            for (r, s) in rhs_e.iter_mut().zip(s) {
                *r += s;
            }
        }

        self.mass_v.eliminate_rhs(&mut rhs_v);
        let (dv, de) = self.solve_mass(&rhs_v, &rhs_e)?;

        Ok(HydroState {
            x: state.v.clone(),
            v: dv,
            e: de,
        })
    }

    fn solve_mass(&mut self, rhs_v: &[f64], rhs_e: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut dv = vec![0.0; rhs_v.len()];
        let mut de = vec![0.0; rhs_e.len()];
        let Self {
            mass_v,
            mass_e,
            cg_v,
            cg_e,
            ..
        } = self;

        #[cfg(feature = "parallel")]
        let (stats_v, stats_e) = rayon::join(
            || cg_v.solve("velocity", mass_v, rhs_v, &mut dv),
            || cg_e.solve("energy", mass_e, rhs_e, &mut de),
        );

        #[cfg(not(feature = "parallel"))]
        let (stats_v, stats_e) = (
            cg_v.solve("velocity", mass_v, rhs_v, &mut dv),
            cg_e.solve("energy", mass_e, rhs_e, &mut de),
        );

        let (stats_v, stats_e) = (stats_v?, stats_e?);
        log::debug!(
            "mass solves: velocity {} its ({:.2e}), energy {} its ({:.2e})",
            stats_v.iterations,
            stats_v.final_residual,
            stats_e.iterations,
            stats_e.final_residual
        );
        Ok((dv, de))
    }

    /// Stable step size for `state`, reduced over all partitions.
    pub fn time_step_estimate(&mut self, state: &HydroState) -> Result<f64> {
        self.ensure_fresh(state)?;
        Ok(self.cache.time_step_estimate(self.cfl, self.comm.as_ref()))
    }

    /// Σ ρ₀·det(J₀)·w · e over all points (collective).
    pub fn internal_energy(&self, state: &HydroState) -> f64 {
        let disc = &self.disc;
        let nq = self.cache.n_points();
        let m = self.cache.rho0_detj0_w();
        let mut el = vec![0.0; disc.l2.dofs_per_zone()];
        let mut local = 0.0;
        for z in 0..disc.n_zones() {
            disc.l2.gather(z, &state.e, &mut el);
            for q in 0..nq {
                local += m[z * nq + q] * disc.l2_shape.interpolate(q, &el);
            }
        }
        self.comm.sum_all(local)
    }

    /// ½ Σ ρ₀·det(J₀)·w · |v|² over all points (collective).
    pub fn kinetic_energy(&self, state: &HydroState) -> f64 {
        let disc = &self.disc;
        let nq = self.cache.n_points();
        let nd = disc.h1.dofs_per_zone();
        let m = self.cache.rho0_detj0_w();
        let mut vl = vec![0.0; 2 * nd];
        let mut local = 0.0;
        for z in 0..disc.n_zones() {
            disc.h1.gather(z, &state.v, &mut vl);
            for q in 0..nq {
                let vx = disc.h1_shape.interpolate(q, &vl[..nd]);
                let vy = disc.h1_shape.interpolate(q, &vl[nd..]);
                local += 0.5 * m[z * nq + q] * (vx * vx + vy * vy);
            }
        }
        self.comm.sum_all(local)
    }

    /// Internal plus kinetic energy (collective).
    pub fn total_energy(&self, state: &HydroState) -> f64 {
        self.internal_energy(state) + self.kinetic_energy(state)
    }

    /// L2 projection of the current density onto the thermodynamic space.
    pub fn density(&mut self, state: &HydroState) -> Result<Vec<f64>> {
        self.ensure_fresh(state)?;
        let disc = &self.disc;
        let nd = disc.l2.dofs_per_zone();
        let weights = self.cache.weights();
        let mut rho = vec![0.0; disc.l2.n_dofs()];

        for z in 0..disc.n_zones() {
            let mut mass = Mat::<f64>::zeros(nd, nd);
            for (q, pt) in self.cache.zone_points(z).iter().enumerate() {
                let wq = weights[q] * pt.det_j;
                let phi = disc.l2_shape.values(q);
                for i in 0..nd {
                    for j in 0..nd {
                        mass[(i, j)] += wq * phi[i] * phi[j];
                    }
                }
            }
            let b = self.force.assemble_rhs_density(&self.cache, z)?;
            let rhs = Mat::from_fn(nd, 1, |i, _| b[i]);
            let sol = mass.as_ref().full_piv_lu().solve(&rhs);
            for (i, &d) in disc.l2.zone_dofs(z).iter().enumerate() {
                rho[d] = sol[(i, 0)];
            }
        }
        Ok(rho)
    }
}

impl ExplicitOperator<HydroState> for HydroOperator {
    fn mult(&mut self, state: &HydroState, t: f64) -> Result<HydroState> {
        HydroOperator::mult(self, state, t)
    }

    fn time_step_estimate(&mut self, state: &HydroState) -> Result<f64> {
        HydroOperator::time_step_estimate(self, state)
    }

    fn invalidate(&mut self) {
        HydroOperator::invalidate(self);
    }
}
