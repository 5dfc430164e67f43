//! Matrix-free linear operators and conjugate gradients.

use crate::error::{HydroError, Result};

/// Square linear operator applied without an assembled matrix.
///
/// `apply` takes `&mut self` so implementations can reuse private scratch
/// buffers between calls.
pub trait LinearOperator {
    /// Number of rows (= columns).
    fn size(&self) -> usize;

    /// y = A·x. `x` is never modified.
    fn apply(&mut self, x: &[f64], y: &mut [f64]);
}

/// Iteration statistics of a converged solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveStats {
    pub iterations: usize,
    pub initial_residual: f64,
    pub final_residual: f64,
}

/// Unpreconditioned conjugate gradients for symmetric positive
/// (semi-)definite operators.
///
/// Converges when ‖r‖ ≤ max(rel_tol·‖b‖, abs_tol).
#[derive(Clone, Debug)]
pub struct ConjugateGradient {
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub max_iter: usize,
    r: Vec<f64>,
    p: Vec<f64>,
    ap: Vec<f64>,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self::new(1e-8, 300)
    }
}

impl ConjugateGradient {
    pub fn new(rel_tol: f64, max_iter: usize) -> Self {
        Self {
            rel_tol,
            abs_tol: 0.0,
            max_iter,
            r: Vec::new(),
            p: Vec::new(),
            ap: Vec::new(),
        }
    }

    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    /// Solve A·x = b starting from the given `x`.
    ///
    /// `system` names the solve in the non-convergence error.
    pub fn solve<A: LinearOperator + ?Sized>(
        &mut self,
        system: &'static str,
        op: &mut A,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveStats> {
        let n = op.size();
        if b.len() != n || x.len() != n {
            return Err(HydroError::size_mismatch("linear system", n, b.len().max(x.len())));
        }
        self.r.resize(n, 0.0);
        self.p.resize(n, 0.0);
        self.ap.resize(n, 0.0);

        op.apply(x, &mut self.ap);
        for i in 0..n {
            self.r[i] = b[i] - self.ap[i];
        }
        self.p.copy_from_slice(&self.r);

        let b_norm = dot(b, b).sqrt();
        let tol = (self.rel_tol * b_norm).max(self.abs_tol);
        let mut rr = dot(&self.r, &self.r);
        let initial_residual = rr.sqrt();

        if initial_residual <= tol {
            return Ok(SolveStats {
                iterations: 0,
                initial_residual,
                final_residual: initial_residual,
            });
        }

        let mut iterations = 0;
        for it in 1..=self.max_iter {
            op.apply(&self.p, &mut self.ap);
            let pap = dot(&self.p, &self.ap);
            if !(pap > 0.0) {
                // Breakdown: the search direction lies in the null space.
                break;
            }
            let alpha = rr / pap;
            for i in 0..n {
                x[i] += alpha * self.p[i];
                self.r[i] -= alpha * self.ap[i];
            }
            iterations = it;

            let rr_new = dot(&self.r, &self.r);
            let res = rr_new.sqrt();
            if res <= tol {
                return Ok(SolveStats {
                    iterations: it,
                    initial_residual,
                    final_residual: res,
                });
            }
            if !res.is_finite() {
                break;
            }

            let beta = rr_new / rr;
            for i in 0..n {
                self.p[i] = self.r[i] + beta * self.p[i];
            }
            rr = rr_new;
        }

        Err(HydroError::SolverNotConverged {
            system,
            iterations,
            residual: dot(&self.r, &self.r).sqrt(),
        })
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
