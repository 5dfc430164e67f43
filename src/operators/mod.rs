//! Finite element operators of the Lagrangian scheme.
//!
//! This module provides:
//! - Geometric factors of the moving mesh (`GeometricFactors2D`)
//! - The matrix-free mass operator with essential-dof elimination
//! - The force assembler coupling kinematic and thermodynamic spaces
//! - The `LinearOperator` abstraction and conjugate gradients

mod force;
mod geometric;
mod linear;
mod mass;

pub use force::{ForceAssembler, ForceOperator};
pub use geometric::{GeometricFactors2D, jacobian_at, position_at};
pub use linear::{ConjugateGradient, LinearOperator, SolveStats};
pub use mass::MassOperator;
