//! Run configuration, loadable from TOML.
//!
//! ```toml
//! [problem]
//! kind = "sedov"
//! blast_energy = 0.25
//! blast_position = [0.0, 0.0]
//!
//! [mesh]
//! zones = [8, 8]
//!
//! [time]
//! cfl = 0.5
//! integrator = "rk4"
//! ```
//!
//! Every section and field is optional; missing values take the defaults
//! below or the problem's own defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HydroError, Result};
use crate::problems::Problem;
use crate::space::default_quadrature_order;
use crate::time::{StandardIntegrator, StepControlConfig};

/// Mesh resolution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Zones per direction; `None` uses the problem default.
    pub zones: Option<(usize, usize)>,
}

/// Polynomial orders of the two spaces and the integration rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscretizationConfig {
    /// Kinematic (position/velocity) order.
    pub order_v: usize,
    /// Thermodynamic (energy) order.
    pub order_e: usize,
    /// Integration rule order; `None` uses 3·order_v + order_e − 1.
    pub order_q: Option<usize>,
}

impl Default for DiscretizationConfig {
    fn default() -> Self {
        Self {
            order_v: 2,
            order_e: 1,
            order_q: None,
        }
    }
}

impl DiscretizationConfig {
    pub fn quadrature_order(&self) -> usize {
        self.order_q
            .unwrap_or_else(|| default_quadrature_order(self.order_v, self.order_e))
    }
}

/// Mass solve settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub cg_rel_tol: f64,
    pub cg_max_iter: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            cg_rel_tol: 1e-8,
            cg_max_iter: 300,
        }
    }
}

/// Time integration settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Final time; `None` uses the problem default.
    pub t_final: Option<f64>,
    pub cfl: f64,
    pub max_steps: Option<usize>,
    pub integrator: StandardIntegrator,
    /// Initial dt; `None` takes the operator estimate.
    pub initial_dt: Option<f64>,
    /// Log progress every n steps (0 disables).
    pub report_interval: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            t_final: None,
            cfl: 0.5,
            max_steps: None,
            integrator: StandardIntegrator::Rk4,
            initial_dt: None,
            report_interval: 5,
        }
    }
}

/// Complete run configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Override of the problem's artificial viscosity setting.
    pub viscosity: Option<bool>,
    pub problem: Problem,
    pub mesh: MeshConfig,
    pub discretization: DiscretizationConfig,
    pub solver: SolverConfig,
    pub time: TimeConfig,
    pub step_control: StepControlConfig,
}

impl SimulationConfig {
    /// Configuration for `problem` with default settings.
    pub fn for_problem(problem: Problem) -> Self {
        Self {
            problem,
            ..Default::default()
        }
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read from a TOML file and validate.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write as TOML.
    pub fn to_toml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn t_final(&self) -> f64 {
        self.time
            .t_final
            .unwrap_or_else(|| self.problem.default_t_final())
    }

    pub fn use_viscosity(&self) -> bool {
        self.viscosity
            .unwrap_or_else(|| self.problem.use_viscosity())
    }

    /// Reject values the run cannot work with.
    pub fn validate(&self) -> Result<()> {
        let d = &self.discretization;
        if d.order_v == 0 {
            return Err(HydroError::invalid_config(
                "discretization.order_v must be at least 1",
            ));
        }
        if d.quadrature_order() == 0 {
            return Err(HydroError::invalid_config(
                "discretization.order_q must be at least 1",
            ));
        }
        if let Some((nx, ny)) = self.mesh.zones
            && (nx == 0 || ny == 0)
        {
            return Err(HydroError::invalid_config(format!(
                "mesh.zones must be positive, got [{nx}, {ny}]"
            )));
        }
        if !(self.time.cfl > 0.0 && self.time.cfl <= 1.0) {
            return Err(HydroError::invalid_config(format!(
                "time.cfl must lie in (0, 1], got {}",
                self.time.cfl
            )));
        }
        if !(self.t_final() > 0.0) {
            return Err(HydroError::invalid_config(format!(
                "time.t_final must be positive, got {}",
                self.t_final()
            )));
        }
        if let Some(dt) = self.time.initial_dt
            && !(dt > 0.0)
        {
            return Err(HydroError::invalid_config(format!(
                "time.initial_dt must be positive, got {dt}"
            )));
        }
        if !(self.solver.cg_rel_tol > 0.0 && self.solver.cg_rel_tol < 1.0) {
            return Err(HydroError::invalid_config(format!(
                "solver.cg_rel_tol must lie in (0, 1), got {}",
                self.solver.cg_rel_tol
            )));
        }
        if self.solver.cg_max_iter == 0 {
            return Err(HydroError::invalid_config(
                "solver.cg_max_iter must be positive",
            ));
        }
        self.step_control.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.discretization.quadrature_order(), 6);
        assert_eq!(config.time.integrator, StandardIntegrator::Rk4);
        assert_eq!(config.t_final(), 0.8);
        assert!(config.use_viscosity());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml() {
        let config = SimulationConfig::from_toml_str(
            r#"
            viscosity = true

            [problem]
            kind = "taylor_green"

            [mesh]
            zones = [4, 6]

            [time]
            t_final = 0.25
            integrator = "ssp_rk3"
            "#,
        )
        .unwrap();
        assert_eq!(config.problem, Problem::TaylorGreen);
        assert_eq!(config.mesh.zones, Some((4, 6)));
        assert_eq!(config.t_final(), 0.25);
        assert_eq!(config.time.integrator, StandardIntegrator::SspRk3);
        assert!(config.use_viscosity());
        assert_eq!(config.time.cfl, 0.5);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = SimulationConfig::default();
        config.time.cfl = 1.5;
        assert!(matches!(config.validate(), Err(HydroError::InvalidConfig(_))));

        let mut config = SimulationConfig::default();
        config.discretization.order_v = 0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.step_control.grow = 0.5;
        assert!(config.validate().is_err());

        assert!(matches!(
            SimulationConfig::from_toml_str("[time]\ncfl = \"fast\""),
            Err(HydroError::Toml(_))
        ));
    }

    #[test]
    fn test_string_round_trip() {
        let mut config = SimulationConfig::for_problem(Problem::Gresho);
        config.step_control.fixed_dt = Some(1e-3);
        config.time.max_steps = Some(10);
        let text = config.to_toml_string().unwrap();
        assert_eq!(SimulationConfig::from_toml_str(&text).unwrap(), config);
    }
}
