//! Legendre polynomial evaluation.
//!
//! P_n(x) are orthogonal on [-1, 1]: ∫ P_m P_n dx = 2/(2n+1) δ_{mn}.
//! They serve two purposes here: as the modal basis for building nodal
//! Lagrange bases through a Vandermonde matrix, and as the root functions
//! for the Gauss and Gauss-Lobatto quadrature nodes.

/// Evaluate P_n(x) with the three-term recurrence
/// (k+1) P_{k+1} = (2k+1) x P_k - k P_{k-1}.
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).0
}

/// Evaluate P'_n(x).
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).1
}

/// Evaluate P_n(x) and P'_n(x) in one recurrence sweep.
///
/// The derivative uses the recurrence P'_{k+1} = P'_{k-1} + (2k+1) P_k,
/// which stays well defined at the endpoints x = ±1.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }

    let (mut p_prev, mut p_curr) = (1.0, x);
    let (mut dp_prev, mut dp_curr) = (0.0, 1.0);

    for k in 1..n {
        let kf = k as f64;
        let p_next = ((2.0 * kf + 1.0) * x * p_curr - kf * p_prev) / (kf + 1.0);
        let dp_next = dp_prev + (2.0 * kf + 1.0) * p_curr;
        p_prev = p_curr;
        p_curr = p_next;
        dp_prev = dp_curr;
        dp_curr = dp_next;
    }

    (p_curr, dp_curr)
}
