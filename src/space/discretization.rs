//! Mesh, spaces, integration rule and shape tables bundled together.

use super::{EssentialDofSet, FiniteElementSpace, H1Space, L2Space};
use crate::basis::{IntegrationRule, ShapeTable};
use crate::error::{HydroError, Result};
use crate::mesh::{BoundarySide, Mesh2D};

/// Default quadrature order for kinematic order `k_v` and thermodynamic
/// order `k_e`: 3·k_v + k_e − 1.
pub fn default_quadrature_order(order_v: usize, order_e: usize) -> usize {
    (3 * order_v + order_e).saturating_sub(1)
}

/// Everything the operators need to know about the discretization.
#[derive(Clone)]
pub struct Discretization {
    pub mesh: Mesh2D,
    pub h1: H1Space,
    pub l2: L2Space,
    pub rule: IntegrationRule,
    /// Kinematic basis at the rule points.
    pub h1_shape: ShapeTable,
    /// Thermodynamic basis at the rule points.
    pub l2_shape: ShapeTable,
}

impl Discretization {
    /// Build spaces of the given orders on `mesh`.
    ///
    /// `order_q` defaults to [`default_quadrature_order`].
    pub fn new(
        mesh: Mesh2D,
        order_v: usize,
        order_e: usize,
        order_q: Option<usize>,
    ) -> Result<Self> {
        if order_v == 0 {
            return Err(HydroError::invalid_config(
                "kinematic order must be at least 1",
            ));
        }
        let order_q = order_q.unwrap_or_else(|| default_quadrature_order(order_v, order_e));

        let h1 = H1Space::new(&mesh, order_v);
        let l2 = L2Space::new(&mesh, order_e);
        let rule = IntegrationRule::tensor_gauss(order_q);
        let h1_shape = ShapeTable::new(h1.basis(), &rule);
        let l2_shape = ShapeTable::new(l2.basis(), &rule);

        log::info!(
            "Discretization: {} zones, {} kinematic dofs (order {}), {} thermodynamic dofs (order {}), {} points per zone",
            mesh.n_elements,
            h1.n_dofs(),
            order_v,
            l2.n_dofs(),
            order_e,
            rule.n_points()
        );

        Ok(Self {
            mesh,
            h1,
            l2,
            rule,
            h1_shape,
            l2_shape,
        })
    }

    #[inline]
    pub fn n_zones(&self) -> usize {
        self.mesh.n_elements
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.rule.n_points()
    }

    /// Initial position field (kinematic space).
    pub fn initial_position(&self) -> Vec<f64> {
        self.h1.node_coordinates(&self.mesh)
    }

    /// Pinned kinematic dofs: the normal velocity component on every wall.
    pub fn essential_dofs(&self) -> EssentialDofSet {
        let mut dofs = Vec::new();
        for side in BoundarySide::ALL {
            if self.mesh.side_tag(side).is_wall() {
                let c = side.normal_component();
                dofs.extend(
                    self.h1
                        .boundary_nodes(side)
                        .into_iter()
                        .map(|node| self.h1.vdof(c, node)),
                );
            }
        }
        EssentialDofSet::new(dofs)
    }
}
