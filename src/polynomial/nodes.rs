//! Quadrature and interpolation nodes on [-1, 1].
//!
//! - Gauss-Lobatto-Legendre (GLL) nodes include the endpoints and are used
//!   as interpolation nodes of the continuous kinematic basis, so that
//!   neighbouring zones share the nodes on their common edge.
//! - Gauss-Legendre (GL) nodes are interior and are used both as the
//!   integration rule and as interpolation nodes of the discontinuous
//!   thermodynamic basis.

use super::legendre::{legendre, legendre_and_derivative};
use std::f64::consts::PI;

const NEWTON_TOL: f64 = 1e-15;
const NEWTON_MAX_ITER: usize = 100;

/// Gauss-Lobatto-Legendre nodes for polynomial order N (N+1 nodes).
///
/// Interior nodes are the roots of P'_N, found by Newton iteration from
/// Chebyshev-Lobatto starting points.
pub fn gauss_lobatto_nodes(order: usize) -> Vec<f64> {
    let n = order;
    if n == 0 {
        return vec![0.0];
    }

    let mut nodes: Vec<f64> = (0..=n).map(|j| -(PI * j as f64 / n as f64).cos()).collect();
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    let nn1 = (n * (n + 1)) as f64;
    for node in nodes.iter_mut().take(n).skip(1) {
        let mut x = *node;
        for _ in 0..NEWTON_MAX_ITER {
            // L(x) = (1-x²) P'_N(x) has L'(x) = -N(N+1) P_N(x).
            let (p_n, dp_n) = legendre_and_derivative(n, x);
            let update = (1.0 - x * x) * dp_n / (nn1 * p_n);
            x += update;
            if update.abs() < NEWTON_TOL {
                break;
            }
        }
        *node = x;
    }

    nodes
}

/// Gauss-Lobatto-Legendre weights: w_j = 2 / (N(N+1) P_N(x_j)²).
pub fn gauss_lobatto_weights(order: usize, nodes: &[f64]) -> Vec<f64> {
    if order == 0 {
        return vec![2.0];
    }
    let denom = (order * (order + 1)) as f64;
    nodes
        .iter()
        .map(|&x| {
            let p = legendre(order, x);
            2.0 / (denom * p * p)
        })
        .collect()
}

/// Gauss-Legendre nodes and weights with `n_points` points.
///
/// Exact for polynomials of degree up to 2·n_points - 1. Nodes are returned
/// in ascending order.
pub fn gauss_legendre(n_points: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(n_points > 0, "Gauss-Legendre rule needs at least one point");

    let n = n_points;
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];

    for i in 0..n {
        // Tricomi initial guess, descending in x.
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..NEWTON_MAX_ITER {
            let (p, d) = legendre_and_derivative(n, x);
            dp = d;
            let update = p / d;
            x -= update;
            if update.abs() < NEWTON_TOL {
                break;
            }
        }
        let (_, d) = legendre_and_derivative(n, x);
        dp = if d != 0.0 { d } else { dp };

        nodes[n - 1 - i] = x;
        weights[n - 1 - i] = 2.0 / ((1.0 - x * x) * dp * dp);
    }

    (nodes, weights)
}
