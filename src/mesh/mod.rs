//! Mesh representation.
//!
//! Provides the initial mesh for the Lagrangian discretization:
//! - 2D structured mesh of quadrilateral zones on a rectangle
//! - Boundary tags per domain side

mod boundary_tags;
mod mesh2d;

pub use boundary_tags::{BoundarySide, BoundaryTag};
pub use mesh2d::Mesh2D;
