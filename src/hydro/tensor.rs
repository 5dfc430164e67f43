//! Small dense 2×2 tensors used at quadrature points.

use std::ops::{Add, Mul, Sub};

/// 2×2 tensor stored row-major: `t.0[row][col]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tensor2(pub [[f64; 2]; 2]);

impl Tensor2 {
    pub const ZERO: Tensor2 = Tensor2([[0.0, 0.0], [0.0, 0.0]]);
    pub const IDENTITY: Tensor2 = Tensor2([[1.0, 0.0], [0.0, 1.0]]);

    #[inline]
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Tensor2([[a, b], [c, d]])
    }

    /// Tensor with the given columns.
    #[inline]
    pub fn from_columns(c0: [f64; 2], c1: [f64; 2]) -> Self {
        Tensor2([[c0[0], c1[0]], [c0[1], c1[1]]])
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[row][col]
    }

    #[inline]
    pub fn det(&self) -> f64 {
        self.0[0][0] * self.0[1][1] - self.0[0][1] * self.0[1][0]
    }

    #[inline]
    pub fn trace(&self) -> f64 {
        self.0[0][0] + self.0[1][1]
    }

    /// Inverse; the caller guarantees a nonzero determinant.
    #[inline]
    pub fn inverse(&self) -> Self {
        let inv_det = 1.0 / self.det();
        Tensor2::new(
            self.0[1][1] * inv_det,
            -self.0[0][1] * inv_det,
            -self.0[1][0] * inv_det,
            self.0[0][0] * inv_det,
        )
    }

    #[inline]
    pub fn transpose(&self) -> Self {
        Tensor2::new(self.0[0][0], self.0[1][0], self.0[0][1], self.0[1][1])
    }

    /// Symmetric part ½(T + Tᵀ).
    #[inline]
    pub fn sym(&self) -> Self {
        let off = 0.5 * (self.0[0][1] + self.0[1][0]);
        Tensor2::new(self.0[0][0], off, off, self.0[1][1])
    }

    #[inline]
    pub fn scale(&self, s: f64) -> Self {
        Tensor2::new(
            s * self.0[0][0],
            s * self.0[0][1],
            s * self.0[1][0],
            s * self.0[1][1],
        )
    }

    /// Matrix-vector product.
    #[inline]
    pub fn apply(&self, v: [f64; 2]) -> [f64; 2] {
        [
            self.0[0][0] * v[0] + self.0[0][1] * v[1],
            self.0[1][0] * v[0] + self.0[1][1] * v[1],
        ]
    }

    #[inline]
    pub fn frobenius_norm_sq(&self) -> f64 {
        self.0.iter().flatten().map(|x| x * x).sum()
    }

    /// Smallest eigenvalue and its unit eigenvector, for a symmetric tensor.
    pub fn min_eigen(&self) -> (f64, [f64; 2]) {
        let a = self.0[0][0];
        let b = 0.5 * (self.0[0][1] + self.0[1][0]);
        let d = self.0[1][1];

        let mean = 0.5 * (a + d);
        let radius = (0.25 * (a - d) * (a - d) + b * b).sqrt();
        let mu = mean - radius;

        if b.abs() <= f64::EPSILON * (a.abs() + d.abs()) || b == 0.0 {
            let dir = if a <= d { [1.0, 0.0] } else { [0.0, 1.0] };
            return (mu, dir);
        }

        // Two candidate eigenvectors; keep the better conditioned one.
        let v1 = [b, mu - a];
        let v2 = [mu - d, b];
        let n1 = v1[0] * v1[0] + v1[1] * v1[1];
        let n2 = v2[0] * v2[0] + v2[1] * v2[1];
        let (v, n) = if n1 >= n2 { (v1, n1) } else { (v2, n2) };
        let n = n.sqrt();
        (mu, [v[0] / n, v[1] / n])
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|x| x.is_finite())
    }

    /// Smallest singular value.
    pub fn min_singular_value(&self) -> f64 {
        // σ_max ± σ_min = sqrt(|T|_F² ± 2|det T|), expanded so neither side
        // cancels; σ_min then follows from σ_max·σ_min = |det T|.
        let [[a, b], [c, d]] = self.0;
        let det = a * d - b * c;
        let (plus, minus) = if det >= 0.0 {
            ((a + d).hypot(b - c), (a - d).hypot(b + c))
        } else {
            ((a - d).hypot(b + c), (a + d).hypot(b - c))
        };
        let max = 0.5 * (plus + minus);
        if max == 0.0 { 0.0 } else { det.abs() / max }
    }
}

impl Add for Tensor2 {
    type Output = Tensor2;

    fn add(self, rhs: Tensor2) -> Tensor2 {
        Tensor2::new(
            self.0[0][0] + rhs.0[0][0],
            self.0[0][1] + rhs.0[0][1],
            self.0[1][0] + rhs.0[1][0],
            self.0[1][1] + rhs.0[1][1],
        )
    }
}

impl Sub for Tensor2 {
    type Output = Tensor2;

    fn sub(self, rhs: Tensor2) -> Tensor2 {
        self + rhs.scale(-1.0)
    }
}

impl Mul for Tensor2 {
    type Output = Tensor2;

    fn mul(self, rhs: Tensor2) -> Tensor2 {
        let mut out = [[0.0; 2]; 2];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = self.0[i][0] * rhs.0[0][j] + self.0[i][1] * rhs.0[1][j];
            }
        }
        Tensor2(out)
    }
}

#[inline]
pub fn norm2(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}
