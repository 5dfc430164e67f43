//! # hydro-rs
//!
//! High-order Lagrangian hydrodynamics on moving quadrilateral meshes.
//!
//! The mesh moves with the flow. Position and velocity live in a continuous
//! (H1) space, specific internal energy in a discontinuous (L2) space, and
//! density follows pointwise from mass conservation. This crate provides:
//! - Polynomial bases and tensor-product integration rules
//! - Structured quadrilateral meshes and the two finite element spaces
//! - A per-point quadrature cache with artificial viscosity
//! - Matrix-free mass operators and the force coupling operator
//! - The explicit right-hand side `HydroOperator`
//! - Explicit Runge-Kutta integrators and an adaptive step controller with
//!   rollback
//! - Named initial conditions, TOML configuration and a simulation runner
//!
//! # Example
//! ```no_run
//! use hydro_rs::{Problem, Simulation, SimulationConfig};
//!
//! let mut config = SimulationConfig::for_problem(Problem::default());
//! config.mesh.zones = Some((16, 16));
//! let result = Simulation::new(config)?.run()?;
//! println!("{} steps, {} rejected", result.summary.steps, result.summary.rejections);
//! # Ok::<(), hydro_rs::HydroError>(())
//! ```

pub mod basis;
pub mod comm;
pub mod config;
pub mod equations;
pub mod error;
pub mod hydro;
pub mod mesh;
pub mod operators;
pub mod polynomial;
pub mod problems;
pub mod simulation;
pub mod space;
pub mod time;

// Re-export main types for convenience
pub use comm::{Communicator, SerialCommunicator, ThreadCommunicator};
pub use config::SimulationConfig;
pub use error::{HydroError, Result};
pub use hydro::{HydroOperator, HydroState, QuadratureCache};
pub use mesh::{BoundaryTag, Mesh2D};
pub use operators::{ConjugateGradient, ForceAssembler, LinearOperator, MassOperator};
pub use problems::Problem;
pub use simulation::{Simulation, SimulationResult};
pub use space::{Discretization, EssentialDofSet, FiniteElementSpace};
pub use time::{ExplicitOperator, StandardIntegrator, StepControlConfig, StepController};
