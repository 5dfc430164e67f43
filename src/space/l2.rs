//! Discontinuous thermodynamic space.

use super::FiniteElementSpace;
use crate::basis::LagrangeBasis1D;
use crate::mesh::Mesh2D;
use crate::polynomial::gauss_legendre;

/// Discontinuous scalar space of order k on Gauss-Legendre nodes.
///
/// Every zone owns (k+1)² contiguous dofs; order 0 is piecewise constant.
#[derive(Clone)]
pub struct L2Space {
    order: usize,
    basis: LagrangeBasis1D,
    n_zones: usize,
    zone_dofs: Vec<usize>,
}

impl L2Space {
    pub fn new(mesh: &Mesh2D, order: usize) -> Self {
        let (nodes, _) = gauss_legendre(order + 1);
        let basis = LagrangeBasis1D::new(&nodes);
        let nd = (order + 1) * (order + 1);
        let zone_dofs = (0..mesh.n_elements * nd).collect();

        Self {
            order,
            basis,
            n_zones: mesh.n_elements,
            zone_dofs,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Physical location of every dof on the initial mesh.
    pub fn node_coordinates(&self, mesh: &Mesh2D) -> Vec<[f64; 2]> {
        let n1 = self.order + 1;
        let nodes = self.basis.nodes();
        let mut out = vec![[0.0; 2]; self.n_dofs()];
        for k in 0..self.n_zones {
            for (i, &d) in self.zone_dofs(k).iter().enumerate() {
                let (x, y) = mesh.reference_to_physical(k, nodes[i % n1], nodes[i / n1]);
                out[d] = [x, y];
            }
        }
        out
    }
}

impl FiniteElementSpace for L2Space {
    fn name(&self) -> &'static str {
        "thermodynamic"
    }

    fn vdim(&self) -> usize {
        1
    }

    fn n_zones(&self) -> usize {
        self.n_zones
    }

    fn n_scalar_dofs(&self) -> usize {
        self.zone_dofs.len()
    }

    fn dofs_per_zone(&self) -> usize {
        (self.order + 1) * (self.order + 1)
    }

    fn zone_dofs(&self, zone: usize) -> &[usize] {
        let nd = self.dofs_per_zone();
        &self.zone_dofs[zone * nd..(zone + 1) * nd]
    }

    fn basis(&self) -> &LagrangeBasis1D {
        &self.basis
    }
}
