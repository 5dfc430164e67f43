//! Lagrangian hydrodynamics core.
//!
//! - `QuadratureCache`: per-point density, stress and characteristic speed
//! - `HydroOperator`: the explicit right-hand side dS/dt and its stable dt
//! - `HydroState`: position, velocity and energy blocks
//! - `Tensor2`: 2×2 tensor algebra at quadrature points

mod operator;
mod quadrature_data;
mod state;
mod tensor;

pub use operator::{CacheState, HydroOperator, PointFunction};
pub use quadrature_data::{PointData, PointInput, QuadratureCache};
pub use state::HydroState;
pub use tensor::{Tensor2, norm2};
