//! Nodal Lagrange basis on [-1, 1] built through a Vandermonde matrix.
//!
//! With V[i,j] = φ_j(r_i) for the normalized Legendre polynomials φ_j, the
//! Lagrange polynomial attached to node i is
//!
//! ℓ_i(x) = Σ_j φ_j(x) · (V⁻¹)[j,i]
//!
//! so evaluating the nodal basis anywhere only needs the modal values at x
//! and the columns of V⁻¹.

use crate::polynomial::legendre_and_derivative;
use faer::{Mat, linalg::solvers::Solve};

/// One-dimensional nodal basis of polynomial order `nodes.len() - 1`.
#[derive(Clone)]
pub struct LagrangeBasis1D {
    nodes: Vec<f64>,
    /// Inverse Vandermonde matrix: modal coefficients of each nodal function.
    v_inv: Mat<f64>,
}

impl LagrangeBasis1D {
    /// Build the basis interpolating at `nodes` (distinct points in [-1, 1]).
    pub fn new(nodes: &[f64]) -> Self {
        let n = nodes.len();
        assert!(n > 0, "Lagrange basis needs at least one node");

        let mut v = Mat::zeros(n, n);
        for (i, &r) in nodes.iter().enumerate() {
            for j in 0..n {
                v[(i, j)] = normalized_legendre(j, r).0;
            }
        }

        let lu = v.as_ref().full_piv_lu();
        let mut v_inv = Mat::zeros(n, n);
        for j in 0..n {
            let mut rhs = Mat::zeros(n, 1);
            rhs[(j, 0)] = 1.0;
            let col = lu.solve(&rhs);
            for i in 0..n {
                v_inv[(i, j)] = col[(i, 0)];
            }
        }

        Self {
            nodes: nodes.to_vec(),
            v_inv,
        }
    }

    /// Number of basis functions.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Polynomial order.
    #[inline]
    pub fn order(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Interpolation nodes.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Values ℓ_i(x) of all basis functions.
    pub fn eval(&self, x: f64) -> Vec<f64> {
        self.eval_with_derivative(x).0
    }

    /// Values and derivatives of all basis functions at x.
    pub fn eval_with_derivative(&self, x: f64) -> (Vec<f64>, Vec<f64>) {
        let n = self.len();
        let modal: Vec<(f64, f64)> = (0..n).map(|j| normalized_legendre(j, x)).collect();

        let mut values = vec![0.0; n];
        let mut derivs = vec![0.0; n];
        for i in 0..n {
            for (j, &(p, dp)) in modal.iter().enumerate() {
                values[i] += p * self.v_inv[(j, i)];
                derivs[i] += dp * self.v_inv[(j, i)];
            }
        }
        (values, derivs)
    }
}

/// φ_j(x) = sqrt((2j+1)/2) P_j(x) and its derivative.
fn normalized_legendre(j: usize, x: f64) -> (f64, f64) {
    let norm = ((2 * j + 1) as f64 / 2.0).sqrt();
    let (p, dp) = legendre_and_derivative(j, x);
    (norm * p, norm * dp)
}
