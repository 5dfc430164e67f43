//! Time integration: explicit integrators and the adaptive step controller.

mod controller;
mod integrator;

pub use controller::{ExplicitOperator, RunSummary, StepControlConfig, StepController, StepReport};
pub use integrator::{
    ForwardEuler, Integrable, IntegratorInfo, RK2, RK4, SSPRK3, StandardIntegrator, TimeIntegrator,
};
