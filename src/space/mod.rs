//! Finite element spaces on the quadrilateral mesh.
//!
//! - `H1Space`: continuous, vector-valued kinematic space (position and
//!   velocity) on Gauss-Lobatto nodes.
//! - `L2Space`: discontinuous, scalar thermodynamic space (specific internal
//!   energy) on Gauss-Legendre nodes.
//! - `Discretization`: the mesh, both spaces, the integration rule and the
//!   shape tables bundled together.
//!
//! Global vector layout is component-major: entry `c·n_scalar + d` holds
//! component c of scalar dof d. Zone-local vectors use the same layout with
//! the zone's dofs: `c·n_local + i`.

mod discretization;
mod h1;
mod l2;

pub use discretization::{Discretization, default_quadrature_order};
pub use h1::H1Space;
pub use l2::L2Space;

use crate::basis::LagrangeBasis1D;

/// Dof numbering and zone gather/scatter for a field space.
pub trait FiniteElementSpace {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Number of vector components.
    fn vdim(&self) -> usize;

    fn n_zones(&self) -> usize;

    /// Number of scalar dofs (per component).
    fn n_scalar_dofs(&self) -> usize;

    /// Total number of dofs over all components.
    fn n_dofs(&self) -> usize {
        self.vdim() * self.n_scalar_dofs()
    }

    /// Scalar dofs per zone.
    fn dofs_per_zone(&self) -> usize;

    /// Global scalar dof indices of a zone, in local basis order.
    fn zone_dofs(&self, zone: usize) -> &[usize];

    /// 1D nodal basis whose tensor product spans the zone space.
    fn basis(&self) -> &LagrangeBasis1D;

    /// Copy the zone's entries of a global vector into `local`.
    fn gather(&self, zone: usize, global: &[f64], local: &mut [f64]) {
        let ns = self.n_scalar_dofs();
        let nl = self.dofs_per_zone();
        let dofs = self.zone_dofs(zone);
        for c in 0..self.vdim() {
            for (i, &d) in dofs.iter().enumerate() {
                local[c * nl + i] = global[c * ns + d];
            }
        }
    }

    /// Add a zone-local vector into a global vector.
    fn scatter_add(&self, zone: usize, local: &[f64], global: &mut [f64]) {
        let ns = self.n_scalar_dofs();
        let nl = self.dofs_per_zone();
        let dofs = self.zone_dofs(zone);
        for c in 0..self.vdim() {
            for (i, &d) in dofs.iter().enumerate() {
                global[c * ns + d] += local[c * nl + i];
            }
        }
    }
}

/// Sorted, duplicate-free set of pinned dof indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EssentialDofSet {
    dofs: Vec<usize>,
}

impl EssentialDofSet {
    pub fn new(mut dofs: Vec<usize>) -> Self {
        dofs.sort_unstable();
        dofs.dedup();
        Self { dofs }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.dofs
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dofs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }

    pub fn contains(&self, dof: usize) -> bool {
        self.dofs.binary_search(&dof).is_ok()
    }

    /// Largest pinned index.
    pub fn max(&self) -> Option<usize> {
        self.dofs.last().copied()
    }

    /// Zero the pinned entries of `v`.
    #[inline]
    pub fn zero_entries(&self, v: &mut [f64]) {
        for &d in &self.dofs {
            v[d] = 0.0;
        }
    }
}
