//! Polynomial evaluation and node generation.
//!
//! This module provides:
//! - 1D Legendre polynomials and their derivatives
//! - Gauss-Lobatto-Legendre nodes and weights
//! - Gauss-Legendre nodes and weights

mod legendre;
mod nodes;

pub use legendre::{legendre, legendre_and_derivative, legendre_derivative};
pub use nodes::{gauss_legendre, gauss_lobatto_nodes, gauss_lobatto_weights};
