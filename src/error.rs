//! Error types for the hydrodynamics core.

use thiserror::Error;

/// Errors raised while configuring or advancing a simulation.
///
/// Configuration variants are fatal and indicate a mismatch between the
/// pieces being wired together. `SolverNotConverged` and `TimeStepCollapse`
/// are numerical failures; `StepFailed` wraps any fatal error raised inside
/// a step with the time and step index where it happened.
#[derive(Error, Debug)]
pub enum HydroError {
    /// Shape tables and quadrature cache were built on different rules.
    #[error("Quadrature rule mismatch: cache uses order {expected}, shape table uses order {actual}")]
    QuadratureRuleMismatch { expected: usize, actual: usize },

    /// A field space was used before it had any degrees of freedom.
    #[error("Finite element space '{0}' is not finalized (no degrees of freedom)")]
    SpaceNotFinalized(&'static str),

    /// The global number of essential dofs changed between calls.
    #[error("Essential dof count mismatch: recorded {recorded}, requested {requested}")]
    EssentialDofMismatch { recorded: usize, requested: usize },

    /// An essential dof index lies outside the space.
    #[error("Essential dof {dof} out of range for space with {n_dofs} dofs")]
    InvalidEssentialDof { dof: usize, n_dofs: usize },

    /// Two collaborators disagree on a size.
    #[error("Size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Conjugate gradients exhausted its iteration budget.
    #[error(
        "{system} solve did not converge in {iterations} iterations (residual {residual:.3e})"
    )]
    SolverNotConverged {
        system: &'static str,
        iterations: usize,
        residual: f64,
    },

    /// Repeated step rejections drove dt below the floor.
    #[error("Time step collapsed to {dt:.3e} at t = {time:.6e} (step {step}): simulation is unstable")]
    TimeStepCollapse { time: f64, step: usize, dt: f64 },

    /// A step was requested after the run reached its end.
    #[error("Run already finished at t = {time:.6e} after {steps} steps")]
    RunFinished { time: f64, steps: usize },

    /// A fatal error raised while attempting a step.
    #[error("Step {step} failed at t = {time:.6e}: {source}")]
    StepFailed {
        step: usize,
        time: f64,
        #[source]
        source: Box<HydroError>,
    },

    /// TOML parse error in a configuration file.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("Config serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// File access error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HydroError {
    /// Create a size mismatch error.
    pub fn size_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Wrap an error raised inside a step.
    pub fn in_step(self, step: usize, time: f64) -> Self {
        match self {
            // Already carries its own context.
            e @ (Self::TimeStepCollapse { .. } | Self::StepFailed { .. }) => e,
            e => Self::StepFailed {
                step,
                time,
                source: Box::new(e),
            },
        }
    }

    /// True for the numerical failures (as opposed to configuration errors).
    pub fn is_numerical(&self) -> bool {
        match self {
            Self::SolverNotConverged { .. } | Self::TimeStepCollapse { .. } => true,
            Self::StepFailed { source, .. } => source.is_numerical(),
            _ => false,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HydroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_step_wraps_once() {
        let err = HydroError::SolverNotConverged {
            system: "velocity",
            iterations: 300,
            residual: 1e-3,
        }
        .in_step(7, 0.25);
        assert!(matches!(err, HydroError::StepFailed { step: 7, .. }));
        assert!(err.is_numerical());

        let rewrapped = err.in_step(8, 0.5);
        assert!(matches!(rewrapped, HydroError::StepFailed { step: 7, .. }));
    }

    #[test]
    fn test_collapse_is_not_wrapped() {
        let err = HydroError::TimeStepCollapse {
            time: 0.1,
            step: 3,
            dt: 1e-17,
        }
        .in_step(3, 0.1);
        assert!(matches!(err, HydroError::TimeStepCollapse { .. }));
        assert!(err.to_string().contains("unstable"));
    }

    #[test]
    fn test_config_errors_are_not_numerical() {
        let err = HydroError::QuadratureRuleMismatch {
            expected: 7,
            actual: 3,
        };
        assert!(!err.is_numerical());
        assert!(err.to_string().contains("order 7"));
    }
}
