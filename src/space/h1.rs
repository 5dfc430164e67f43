//! Continuous kinematic space.

use super::FiniteElementSpace;
use crate::basis::LagrangeBasis1D;
use crate::mesh::{BoundarySide, Mesh2D};
use crate::polynomial::gauss_lobatto_nodes;

/// Continuous, vector-valued (2 components) space of order k on
/// Gauss-Lobatto nodes.
///
/// Nodes form an (nx·k+1) × (ny·k+1) lattice numbered row by row, so zones
/// sharing an edge share the k+1 nodes on it.
#[derive(Clone)]
pub struct H1Space {
    order: usize,
    basis: LagrangeBasis1D,
    n_zones: usize,
    nodes_x: usize,
    nodes_y: usize,
    /// zone_nodes[k·(k+1)² + i] = global node of local node i in zone k
    zone_nodes: Vec<usize>,
}

impl H1Space {
    pub fn new(mesh: &Mesh2D, order: usize) -> Self {
        assert!(order >= 1, "continuous space needs order >= 1");

        let basis = LagrangeBasis1D::new(&gauss_lobatto_nodes(order));
        let n1 = order + 1;
        let nodes_x = mesh.nx * order + 1;
        let nodes_y = mesh.ny * order + 1;

        let mut zone_nodes = Vec::with_capacity(mesh.n_elements * n1 * n1);
        for k in 0..mesh.n_elements {
            let (ex, ey) = mesh.element_ij(k);
            for iy in 0..n1 {
                for ix in 0..n1 {
                    let gx = ex * order + ix;
                    let gy = ey * order + iy;
                    zone_nodes.push(gy * nodes_x + gx);
                }
            }
        }

        Self {
            order,
            basis,
            n_zones: mesh.n_elements,
            nodes_x,
            nodes_y,
            zone_nodes,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of lattice nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes_x * self.nodes_y
    }

    /// Global vector index of component `c` at node `node`.
    #[inline]
    pub fn vdof(&self, c: usize, node: usize) -> usize {
        c * self.n_nodes() + node
    }

    /// Nodes lying on one side of the domain.
    pub fn boundary_nodes(&self, side: BoundarySide) -> Vec<usize> {
        let (nx, ny) = (self.nodes_x, self.nodes_y);
        match side {
            BoundarySide::South => (0..nx).collect(),
            BoundarySide::North => ((ny - 1) * nx..ny * nx).collect(),
            BoundarySide::West => (0..ny).map(|j| j * nx).collect(),
            BoundarySide::East => (0..ny).map(|j| j * nx + nx - 1).collect(),
        }
    }

    /// Position field interpolating the initial mesh map.
    pub fn node_coordinates(&self, mesh: &Mesh2D) -> Vec<f64> {
        let n = self.n_nodes();
        let n1 = self.order + 1;
        let gll = self.basis.nodes();
        let mut x = vec![0.0; 2 * n];

        for k in 0..self.n_zones {
            let nodes = self.zone_dofs(k);
            for iy in 0..n1 {
                for ix in 0..n1 {
                    let (px, py) = mesh.reference_to_physical(k, gll[ix], gll[iy]);
                    let g = nodes[iy * n1 + ix];
                    x[g] = px;
                    x[n + g] = py;
                }
            }
        }
        x
    }
}

impl FiniteElementSpace for H1Space {
    fn name(&self) -> &'static str {
        "kinematic"
    }

    fn vdim(&self) -> usize {
        2
    }

    fn n_zones(&self) -> usize {
        self.n_zones
    }

    fn n_scalar_dofs(&self) -> usize {
        self.n_nodes()
    }

    fn dofs_per_zone(&self) -> usize {
        (self.order + 1) * (self.order + 1)
    }

    fn zone_dofs(&self, zone: usize) -> &[usize] {
        let nd = self.dofs_per_zone();
        &self.zone_nodes[zone * nd..(zone + 1) * nd]
    }

    fn basis(&self) -> &LagrangeBasis1D {
        &self.basis
    }
}
