//! Simulation runner: configuration to finished run.

use std::sync::Arc;

use crate::comm::{Communicator, SerialCommunicator};
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::hydro::{HydroOperator, HydroState};
use crate::space::Discretization;
use crate::time::{IntegratorInfo, RunSummary, StepController, StepReport};

// =============================================================================
// Energy Diagnostics
// =============================================================================

/// Internal and kinetic energy of a state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnergyBalance {
    pub internal: f64,
    pub kinetic: f64,
}

impl EnergyBalance {
    #[inline]
    pub fn total(&self) -> f64 {
        self.internal + self.kinetic
    }
}

// =============================================================================
// Simulation Result
// =============================================================================

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    pub summary: RunSummary,
    pub initial_energy: EnergyBalance,
    pub final_energy: EnergyBalance,
}

impl SimulationResult {
    /// Relative change of the total energy over the run.
    pub fn energy_drift(&self) -> f64 {
        let e0 = self.initial_energy.total();
        let change = self.final_energy.total() - e0;
        if e0 != 0.0 { change / e0.abs() } else { change }
    }
}

// =============================================================================
// Simulation
// =============================================================================

/// Discretization, state, operator and step controller built from one
/// [`SimulationConfig`].
pub struct Simulation {
    config: SimulationConfig,
    operator: HydroOperator,
    state: HydroState,
    controller: StepController,
}

impl Simulation {
    /// Single-partition simulation.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_communicator(config, Arc::new(SerialCommunicator))
    }

    /// Simulation on one partition of a group. Collective.
    pub fn with_communicator(config: SimulationConfig, comm: Arc<dyn Communicator>) -> Result<Self> {
        config.validate()?;
        let problem = &config.problem;
        let d = &config.discretization;

        let mesh = problem.mesh(config.mesh.zones)?;
        let disc = Discretization::new(mesh, d.order_v, d.order_e, Some(d.quadrature_order()))?;
        let state = problem.initial_state(&disc)?;
        let use_viscosity = config.use_viscosity();
        let cache = problem.quadrature_cache(&disc, &state.x, use_viscosity)?;

        let mut operator = HydroOperator::new(disc, cache, comm)?
            .with_cfl(config.time.cfl)
            .with_solver(config.solver.cg_rel_tol, config.solver.cg_max_iter);
        if let Some(source) = problem.energy_source() {
            operator = operator.with_energy_source(source);
        }

        let mut controller = StepController::new(
            config.time.integrator,
            config.step_control.clone(),
            config.t_final(),
        )
        .with_report_interval(config.time.report_interval);
        if let Some(n) = config.time.max_steps {
            controller = controller.with_max_steps(n);
        }
        if let Some(dt) = config.time.initial_dt {
            controller = controller.with_initial_dt(dt);
        }

        log::info!(
            "Problem {}: t_final = {}, viscosity {}, integrator {}",
            problem.name(),
            config.t_final(),
            if use_viscosity { "on" } else { "off" },
            config.time.integrator.name()
        );

        Ok(Self {
            config,
            operator,
            state,
            controller,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &HydroState {
        &self.state
    }

    pub fn operator(&self) -> &HydroOperator {
        &self.operator
    }

    pub fn operator_mut(&mut self) -> &mut HydroOperator {
        &mut self.operator
    }

    pub fn controller(&self) -> &StepController {
        &self.controller
    }

    pub fn time(&self) -> f64 {
        self.controller.time()
    }

    /// Energy of the current state (collective).
    pub fn energy(&self) -> EnergyBalance {
        EnergyBalance {
            internal: self.operator.internal_energy(&self.state),
            kinetic: self.operator.kinetic_energy(&self.state),
        }
    }

    /// Density projected on the thermodynamic space.
    pub fn density(&mut self) -> Result<Vec<f64>> {
        self.operator.density(&self.state)
    }

    /// Take one accepted step.
    pub fn step(&mut self) -> Result<StepReport> {
        self.controller.advance(&mut self.operator, &mut self.state)
    }

    /// Run to the final time.
    pub fn run(&mut self) -> Result<SimulationResult> {
        self.run_with_callback(|_, _| {})
    }

    /// Run, calling `callback` after every accepted step.
    pub fn run_with_callback<F>(&mut self, callback: F) -> Result<SimulationResult>
    where
        F: FnMut(&StepReport, &HydroState),
    {
        let initial_energy = self.energy();
        let summary =
            self.controller
                .run_with_callback(&mut self.operator, &mut self.state, callback)?;
        let final_energy = self.energy();

        let result = SimulationResult {
            summary,
            initial_energy,
            final_energy,
        };
        log::info!(
            "Energy: initial {:.10e}, final {:.10e} (IE {:.6e}, KE {:.6e}), relative change {:.3e}",
            initial_energy.total(),
            final_energy.total(),
            final_energy.internal,
            final_energy.kinetic,
            result.energy_drift()
        );
        Ok(result)
    }
}
