//! Tensor-product shape functions tabulated at integration points.

use super::{IntegrationRule, LagrangeBasis1D};

/// Values and reference gradients of a tensor-product nodal basis at the
/// points of one integration rule.
///
/// Local basis functions are numbered with the ξ index fastest:
/// i = iy·(k+1) + ix.
#[derive(Clone)]
pub struct ShapeTable {
    n_dofs: usize,
    n_points: usize,
    rule_order: usize,
    /// values[q * n_dofs + i] = φ_i(ξ_q)
    values: Vec<f64>,
    /// grads[q * n_dofs + i] = [∂φ_i/∂ξ, ∂φ_i/∂η](ξ_q)
    grads: Vec<[f64; 2]>,
}

impl ShapeTable {
    pub fn new(basis: &LagrangeBasis1D, rule: &IntegrationRule) -> Self {
        let n1 = basis.len();
        let n_dofs = n1 * n1;

        let tab_1d: Vec<(Vec<f64>, Vec<f64>)> = rule
            .points_1d()
            .iter()
            .map(|&x| basis.eval_with_derivative(x))
            .collect();

        let nq1 = rule.n_points_1d();
        let n_points = nq1 * nq1;
        let mut values = Vec::with_capacity(n_points * n_dofs);
        let mut grads = Vec::with_capacity(n_points * n_dofs);

        for qy in 0..nq1 {
            for qx in 0..nq1 {
                let (bx, dbx) = &tab_1d[qx];
                let (by, dby) = &tab_1d[qy];
                for iy in 0..n1 {
                    for ix in 0..n1 {
                        values.push(bx[ix] * by[iy]);
                        grads.push([dbx[ix] * by[iy], bx[ix] * dby[iy]]);
                    }
                }
            }
        }

        Self {
            n_dofs,
            n_points,
            rule_order: rule.order(),
            values,
            grads,
        }
    }

    #[inline]
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Order of the integration rule this table was built on.
    #[inline]
    pub fn rule_order(&self) -> usize {
        self.rule_order
    }

    /// All basis values at point q.
    #[inline]
    pub fn values(&self, q: usize) -> &[f64] {
        &self.values[q * self.n_dofs..(q + 1) * self.n_dofs]
    }

    /// All reference gradients at point q.
    #[inline]
    pub fn grads(&self, q: usize) -> &[[f64; 2]] {
        &self.grads[q * self.n_dofs..(q + 1) * self.n_dofs]
    }

    /// Interpolate a scalar local field at point q.
    #[inline]
    pub fn interpolate(&self, q: usize, local: &[f64]) -> f64 {
        self.values(q).iter().zip(local).map(|(a, b)| a * b).sum()
    }

    /// Reference gradient of a scalar local field at point q.
    #[inline]
    pub fn reference_gradient(&self, q: usize, local: &[f64]) -> [f64; 2] {
        let mut g = [0.0; 2];
        for (grad, &u) in self.grads(q).iter().zip(local) {
            g[0] += grad[0] * u;
            g[1] += grad[1] * u;
        }
        g
    }
}
