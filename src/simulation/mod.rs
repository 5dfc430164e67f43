//! High-level simulation runner.
//!
//! Ties together:
//! - the configured problem and discretization
//! - the hydro operator and its quadrature cache
//! - the adaptive step controller and energy diagnostics
//!
//! # Example
//! ```no_run
//! use hydro_rs::config::SimulationConfig;
//! use hydro_rs::problems::Problem;
//! use hydro_rs::simulation::Simulation;
//!
//! let config = SimulationConfig::for_problem(Problem::TaylorGreen);
//! let mut sim = Simulation::new(config)?;
//! let result = sim.run_with_callback(|report, _state| {
//!     println!("step {} t = {:.4}", report.step, report.time);
//! })?;
//! println!("energy drift {:.2e}", result.energy_drift());
//! # Ok::<(), hydro_rs::HydroError>(())
//! ```

mod runner;

pub use runner::{EnergyBalance, Simulation, SimulationResult};
