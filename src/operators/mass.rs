//! Matrix-free mass operator with essential-dof elimination.
//!
//! The weighted mass matrix M_ij = ∫ ρ φ_i φ_j dx is never formed. Since
//! ρ·det(J) is the Lagrangian invariant ρ₀·det(J₀), the quadrature weights of
//! the action are fixed for the whole run:
//!
//! (M x)_i = Σ_q B_qi · W_q · Σ_j B_qj x_j,   W_q = ρ₀·det(J₀)·w_q
//!
//! and the operator only needs the basis table B and this weighting table.
//! Vector spaces apply the same scalar mass to each component.

use super::linear::LinearOperator;
use crate::basis::ShapeTable;
use crate::comm::Communicator;
use crate::error::{HydroError, Result};
use crate::hydro::QuadratureCache;
use crate::space::{EssentialDofSet, FiniteElementSpace};

/// Partial-assembly mass operator for one field space.
#[derive(Clone)]
pub struct MassOperator {
    space_name: &'static str,
    vdim: usize,
    n_zones: usize,
    n_scalar: usize,
    dofs_per_zone: usize,
    /// zone_dofs[z · dofs_per_zone + i]
    zone_dofs: Vec<usize>,
    shape: ShapeTable,
    /// W[z · n_points + q]; `None` until `setup`.
    weights: Option<Vec<f64>>,
    ess: EssentialDofSet,
    /// Global pinned count recorded by the last `set_essential_dofs`. Only
    /// checked against later calls; no storage depends on it.
    ess_global: usize,
    /// Full local layout, sized once at construction.
    scratch: Vec<f64>,
}

impl MassOperator {
    /// Capture the dof map of `space` and its basis table.
    pub fn new<S: FiniteElementSpace + ?Sized>(space: &S, shape: &ShapeTable) -> Self {
        let n_zones = space.n_zones();
        let mut zone_dofs = Vec::with_capacity(n_zones * space.dofs_per_zone());
        for z in 0..n_zones {
            zone_dofs.extend_from_slice(space.zone_dofs(z));
        }

        Self {
            space_name: space.name(),
            vdim: space.vdim(),
            n_zones,
            n_scalar: space.n_scalar_dofs(),
            dofs_per_zone: space.dofs_per_zone(),
            zone_dofs,
            shape: shape.clone(),
            weights: None,
            ess: EssentialDofSet::empty(),
            ess_global: 0,
            scratch: vec![0.0; space.n_dofs()],
        }
    }

    #[inline]
    pub fn n_dofs(&self) -> usize {
        self.vdim * self.n_scalar
    }

    pub fn is_setup(&self) -> bool {
        self.weights.is_some()
    }

    pub fn essential_dofs(&self) -> &EssentialDofSet {
        &self.ess
    }

    /// Pinned count summed over all partitions (0 before any call).
    pub fn global_essential_count(&self) -> usize {
        self.ess_global
    }

    /// Build the weighting table from the invariant ρ₀·det(J₀)·w.
    pub fn setup(&mut self, cache: &QuadratureCache) -> Result<()> {
        if self.n_dofs() == 0 {
            return Err(HydroError::SpaceNotFinalized(self.space_name));
        }
        cache.check_rule_order(self.shape.rule_order())?;
        if cache.n_zones() != self.n_zones {
            return Err(HydroError::size_mismatch("zones", cache.n_zones(), self.n_zones));
        }
        if cache.n_points() != self.shape.n_points() {
            return Err(HydroError::size_mismatch(
                "points per zone",
                cache.n_points(),
                self.shape.n_points(),
            ));
        }
        if self.shape.n_dofs() != self.dofs_per_zone {
            return Err(HydroError::size_mismatch(
                "dofs per zone",
                self.dofs_per_zone,
                self.shape.n_dofs(),
            ));
        }

        self.weights = Some(cache.rho0_detj0_w().to_vec());
        Ok(())
    }

    /// Record the pinned dofs.
    ///
    /// This is a collective call: the global pinned count is summed over all
    /// partitions before any local validation. The count is kept only to
    /// detect a later call with a different nonzero total; the elimination
    /// scratch already spans every local dof.
    pub fn set_essential_dofs(
        &mut self,
        dofs: &EssentialDofSet,
        comm: &dyn Communicator,
    ) -> Result<()> {
        let global = comm.sum_all_usize(dofs.len());

        if let Some(max) = dofs.max()
            && max >= self.n_dofs()
        {
            return Err(HydroError::InvalidEssentialDof {
                dof: max,
                n_dofs: self.n_dofs(),
            });
        }
        if self.ess_global != 0 && global != 0 && global != self.ess_global {
            return Err(HydroError::EssentialDofMismatch {
                recorded: self.ess_global,
                requested: global,
            });
        }

        self.ess = dofs.clone();
        self.ess_global = global;
        Ok(())
    }

    /// Zero the pinned entries of a right-hand side.
    pub fn eliminate_rhs(&self, b: &mut [f64]) {
        self.ess.zero_entries(b);
    }

    /// y = M·x with symmetric elimination of the pinned dofs.
    ///
    /// # Panics
    ///
    /// Panics if called before `setup`.
    pub fn mult(&mut self, x: &[f64], y: &mut [f64]) {
        let weights = self
            .weights
            .as_deref()
            .expect("MassOperator::apply called before setup");
        assert_eq!(x.len(), self.n_dofs(), "input size");
        assert_eq!(y.len(), self.n_dofs(), "output size");

        self.scratch.copy_from_slice(x);
        self.ess.zero_entries(&mut self.scratch);

        partial_assembly_mult(
            &self.shape,
            weights,
            &self.zone_dofs,
            self.dofs_per_zone,
            self.n_scalar,
            self.vdim,
            &self.scratch,
            y,
        );

        self.ess.zero_entries(y);
    }
}

impl LinearOperator for MassOperator {
    fn size(&self) -> usize {
        self.n_dofs()
    }

    fn apply(&mut self, x: &[f64], y: &mut [f64]) {
        self.mult(x, y);
    }
}

/// Zone-by-zone mass action from the weighting table.
#[allow(clippy::too_many_arguments)]
fn partial_assembly_mult(
    shape: &ShapeTable,
    weights: &[f64],
    zone_dofs: &[usize],
    nd: usize,
    n_scalar: usize,
    vdim: usize,
    x: &[f64],
    y: &mut [f64],
) {
    y.fill(0.0);
    let nq = shape.n_points();
    let mut xl = vec![0.0; nd];
    let mut yl = vec![0.0; nd];

    for (z, dofs) in zone_dofs.chunks(nd).enumerate() {
        let w = &weights[z * nq..(z + 1) * nq];
        for c in 0..vdim {
            let off = c * n_scalar;
            for (i, &d) in dofs.iter().enumerate() {
                xl[i] = x[off + d];
            }
            yl.fill(0.0);
            for (q, &wq) in w.iter().enumerate() {
                let b = shape.values(q);
                let t = wq * shape.interpolate(q, &xl);
                for (yi, bi) in yl.iter_mut().zip(b) {
                    *yi += bi * t;
                }
            }
            for (i, &d) in dofs.iter().enumerate() {
                y[off + d] += yl[i];
            }
        }
    }
}
