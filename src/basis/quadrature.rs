//! Tensor-product Gauss-Legendre integration on the reference square.

use crate::polynomial::gauss_legendre;

/// Integration rule on [-1, 1]², exact for polynomials of degree `order` in
/// each variable.
///
/// Points are ordered with the ξ index fastest: q = qy·n1 + qx.
#[derive(Clone, Debug)]
pub struct IntegrationRule {
    order: usize,
    points_1d: Vec<f64>,
    weights_1d: Vec<f64>,
    points: Vec<[f64; 2]>,
    weights: Vec<f64>,
}

impl IntegrationRule {
    /// Smallest Gauss rule exact to `order`: n1 = order/2 + 1 points per direction.
    pub fn tensor_gauss(order: usize) -> Self {
        let n1 = order / 2 + 1;
        let (points_1d, weights_1d) = gauss_legendre(n1);

        let mut points = Vec::with_capacity(n1 * n1);
        let mut weights = Vec::with_capacity(n1 * n1);
        for qy in 0..n1 {
            for qx in 0..n1 {
                points.push([points_1d[qx], points_1d[qy]]);
                weights.push(weights_1d[qx] * weights_1d[qy]);
            }
        }

        Self {
            order,
            points_1d,
            weights_1d,
            points,
            weights,
        }
    }

    /// Polynomial degree integrated exactly (as requested at construction).
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of points per zone.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Number of points per direction.
    #[inline]
    pub fn n_points_1d(&self) -> usize {
        self.points_1d.len()
    }

    pub fn points_1d(&self) -> &[f64] {
        &self.points_1d
    }

    pub fn weights_1d(&self) -> &[f64] {
        &self.weights_1d
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}
