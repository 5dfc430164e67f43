//! Polynomial basis representations.
//!
//! This module provides:
//! - 1D nodal Lagrange bases built from a Vandermonde matrix
//! - Tensor-product Gauss integration rules on the reference square
//! - Shape tables: tensor-product basis values and gradients at rule points

mod lagrange;
mod quadrature;
mod shape;

pub use lagrange::LagrangeBasis1D;
pub use quadrature::IntegrationRule;
pub use shape::ShapeTable;
