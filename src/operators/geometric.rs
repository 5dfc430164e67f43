//! Geometric factors of the moving mesh at quadrature points.
//!
//! The reference-to-physical map of a zone is the kinematic-space
//! interpolant of the position field, so its Jacobian at point q is
//!
//! J[c][b] = Σ_i x_{c,i} ∂φ_i/∂ξ_b(ξ_q)
//!
//! and physical gradients follow from ∇u = ∇̂u · J⁻¹.

use crate::basis::ShapeTable;
use crate::hydro::Tensor2;
use crate::space::{Discretization, FiniteElementSpace};

/// Jacobian of the map at point q from zone-local position dofs
/// (component-major, length 2·n_dofs).
#[inline]
pub fn jacobian_at(shape: &ShapeTable, q: usize, local_pos: &[f64]) -> Tensor2 {
    let nd = shape.n_dofs();
    let gx = shape.reference_gradient(q, &local_pos[..nd]);
    let gy = shape.reference_gradient(q, &local_pos[nd..2 * nd]);
    Tensor2([gx, gy])
}

/// Physical coordinates of point q.
#[inline]
pub fn position_at(shape: &ShapeTable, q: usize, local_pos: &[f64]) -> [f64; 2] {
    let nd = shape.n_dofs();
    [
        shape.interpolate(q, &local_pos[..nd]),
        shape.interpolate(q, &local_pos[nd..2 * nd]),
    ]
}

/// Jacobians and determinants at every point of every zone.
#[derive(Clone)]
pub struct GeometricFactors2D {
    /// jacobian[zone · n_points + q]
    pub jacobian: Vec<Tensor2>,

    /// Jacobian determinant, same indexing.
    pub det_j: Vec<f64>,

    pub n_zones: usize,
    pub n_points: usize,
}

impl GeometricFactors2D {
    /// Compute geometric factors for the given position field.
    pub fn compute(disc: &Discretization, position: &[f64]) -> Self {
        let n_zones = disc.n_zones();
        let n_points = disc.n_points();
        let shape = &disc.h1_shape;

        let mut jacobian = Vec::with_capacity(n_zones * n_points);
        let mut det_j = Vec::with_capacity(n_zones * n_points);
        let mut local = vec![0.0; 2 * shape.n_dofs()];

        for k in 0..n_zones {
            disc.h1.gather(k, position, &mut local);
            for q in 0..n_points {
                let jac = jacobian_at(shape, q, &local);
                det_j.push(jac.det());
                jacobian.push(jac);
            }
        }

        Self {
            jacobian,
            det_j,
            n_zones,
            n_points,
        }
    }

    #[inline]
    pub fn jacobian(&self, zone: usize, q: usize) -> Tensor2 {
        self.jacobian[zone * self.n_points + q]
    }

    #[inline]
    pub fn det(&self, zone: usize, q: usize) -> f64 {
        self.det_j[zone * self.n_points + q]
    }

    /// Smallest determinant over the mesh; nonpositive means a tangled zone.
    pub fn min_det(&self) -> f64 {
        self.det_j.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh2D;

    #[test]
    fn test_affine_jacobian() {
        // 2×1 zones on [0,4]×[0,1]: each zone is 2 wide and 1 tall.
        let mesh = Mesh2D::uniform_rectangle(0.0, 4.0, 0.0, 1.0, 2, 1);
        let disc = Discretization::new(mesh, 2, 1, None).unwrap();
        let x = disc.initial_position();
        let geom = GeometricFactors2D::compute(&disc, &x);

        for k in 0..2 {
            for q in 0..disc.n_points() {
                let j = geom.jacobian(k, q);
                assert!((j.get(0, 0) - 1.0).abs() < 1e-13);
                assert!((j.get(1, 1) - 0.5).abs() < 1e-13);
                assert!(j.get(0, 1).abs() < 1e-13);
                assert!(j.get(1, 0).abs() < 1e-13);
                assert!((geom.det(k, q) - 0.5).abs() < 1e-13);
            }
        }
        assert!(geom.min_det() > 0.0);
    }

    #[test]
    fn test_points_map_into_zone() {
        let mesh = Mesh2D::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 1, 1);
        let disc = Discretization::new(mesh, 1, 0, Some(1)).unwrap();
        let x = disc.initial_position();
        let mut local = vec![0.0; 8];
        disc.h1.gather(0, &x, &mut local);
        let p = position_at(&disc.h1_shape, 0, &local);
        assert!((p[0] - 0.5).abs() < 1e-14);
        assert!((p[1] - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_inverted_zone_has_negative_det() {
        let mesh = Mesh2D::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 1, 1);
        let disc = Discretization::new(mesh, 1, 0, None).unwrap();
        let mut x = disc.initial_position();
        // Mirror x-coordinates.
        for v in x.iter_mut().take(disc.h1.n_nodes()) {
            *v = -*v;
        }
        let geom = GeometricFactors2D::compute(&disc, &x);
        assert!(geom.min_det() < 0.0);
    }
}
