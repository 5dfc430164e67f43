//! Trait-based explicit time integrators.
//!
//! The right-hand side is fallible: a stage evaluation that fails (for
//! example a mass solve that does not converge) aborts the step and the
//! error is returned to the caller unchanged. The state may then hold a
//! partially updated value, so callers that need rollback keep a copy.
//!
//! # Example
//! ```
//! use hydro_rs::time::{TimeIntegrator, RK4};
//!
//! // du/dt = -u
//! let mut u = vec![1.0, 2.0];
//! RK4.step(&mut u, 0.01, 0.0, |state: &Vec<f64>, _t| {
//!     Ok::<_, ()>(state.iter().map(|x| -x).collect())
//! })
//! .unwrap();
//! assert!(u[0] < 1.0);
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// Integrable Trait
// =============================================================================

/// Vector space operations needed by explicit integrators.
pub trait Integrable: Clone + Send + Sized {
    /// self <- c * self
    fn scale(&mut self, c: f64);

    /// self <- self + c * other
    fn axpy(&mut self, c: f64, other: &Self);

    /// Zero-initialized value with the same shape.
    fn zeros_like(&self) -> Self {
        let mut result = self.clone();
        result.scale(0.0);
        result
    }
}

impl Integrable for Vec<f64> {
    fn scale(&mut self, c: f64) {
        for v in self.iter_mut() {
            *v *= c;
        }
    }

    fn axpy(&mut self, c: f64, other: &Self) {
        for (v, o) in self.iter_mut().zip(other) {
            *v += c * o;
        }
    }
}

// =============================================================================
// IntegratorInfo Trait (non-generic, dyn-compatible)
// =============================================================================

/// Non-generic information about a time integrator.
pub trait IntegratorInfo: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Order of accuracy.
    fn order(&self) -> usize;

    /// Number of right-hand-side evaluations per step.
    fn n_stages(&self) -> usize;

    /// Stage times relative to the step start.
    fn stage_times(&self, dt: f64) -> Vec<f64>;
}

// =============================================================================
// TimeIntegrator Trait
// =============================================================================

/// Explicit one-step integrator.
pub trait TimeIntegrator<S: Integrable>: IntegratorInfo {
    /// Advance `state` from `t` to `t + dt`.
    ///
    /// `rhs(state, time)` returns the time derivative or an error that
    /// aborts the step.
    fn step<F, E>(&self, state: &mut S, dt: f64, t: f64, rhs: F) -> Result<(), E>
    where
        F: FnMut(&S, f64) -> Result<S, E>;
}

// =============================================================================
// Forward Euler
// =============================================================================

/// Forward Euler (1st order).
///
/// ```text
/// u_new = u + dt * L(u, t)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl IntegratorInfo for ForwardEuler {
    fn name(&self) -> &'static str {
        "forward-euler"
    }

    fn order(&self) -> usize {
        1
    }

    fn n_stages(&self) -> usize {
        1
    }

    fn stage_times(&self, _dt: f64) -> Vec<f64> {
        vec![0.0]
    }
}

impl<S: Integrable> TimeIntegrator<S> for ForwardEuler {
    fn step<F, E>(&self, state: &mut S, dt: f64, t: f64, mut rhs: F) -> Result<(), E>
    where
        F: FnMut(&S, f64) -> Result<S, E>,
    {
        let l_u = rhs(state, t)?;
        state.axpy(dt, &l_u);
        Ok(())
    }
}

// =============================================================================
// RK2 (explicit midpoint)
// =============================================================================

/// Explicit midpoint rule (2nd order).
///
/// ```text
/// u_half = u + dt/2 * L(u, t)
/// u_new  = u + dt * L(u_half, t + dt/2)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RK2;

impl IntegratorInfo for RK2 {
    fn name(&self) -> &'static str {
        "rk2-midpoint"
    }

    fn order(&self) -> usize {
        2
    }

    fn n_stages(&self) -> usize {
        2
    }

    fn stage_times(&self, dt: f64) -> Vec<f64> {
        vec![0.0, 0.5 * dt]
    }
}

impl<S: Integrable> TimeIntegrator<S> for RK2 {
    fn step<F, E>(&self, state: &mut S, dt: f64, t: f64, mut rhs: F) -> Result<(), E>
    where
        F: FnMut(&S, f64) -> Result<S, E>,
    {
        let k1 = rhs(state, t)?;
        let mut u_half = state.clone();
        u_half.axpy(0.5 * dt, &k1);

        let k2 = rhs(&u_half, t + 0.5 * dt)?;
        state.axpy(dt, &k2);
        Ok(())
    }
}

// =============================================================================
// SSP-RK3 Implementation
// =============================================================================

/// Strong Stability Preserving Runge-Kutta 3rd order (Shu-Osher form).
///
/// ```text
/// u1 = u + dt * L(u, t)
/// u2 = 3/4 * u + 1/4 * u1 + 1/4 * dt * L(u1, t + dt)
/// u_new = 1/3 * u + 2/3 * u2 + 2/3 * dt * L(u2, t + dt/2)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SSPRK3;

impl IntegratorInfo for SSPRK3 {
    fn name(&self) -> &'static str {
        "ssp-rk3"
    }

    fn order(&self) -> usize {
        3
    }

    fn n_stages(&self) -> usize {
        3
    }

    fn stage_times(&self, dt: f64) -> Vec<f64> {
        vec![0.0, dt, 0.5 * dt]
    }
}

impl<S: Integrable> TimeIntegrator<S> for SSPRK3 {
    fn step<F, E>(&self, state: &mut S, dt: f64, t: f64, mut rhs: F) -> Result<(), E>
    where
        F: FnMut(&S, f64) -> Result<S, E>,
    {
        // Stage 1: u1 = u + dt * L(u, t)
        let l_u = rhs(state, t)?;
        let mut u1 = state.clone();
        u1.axpy(dt, &l_u);

        // Stage 2: u2 = 3/4 * u + 1/4 * u1 + 1/4 * dt * L(u1, t + dt)
        let l_u1 = rhs(&u1, t + dt)?;
        let mut u2 = state.clone();
        u2.scale(0.75);
        u2.axpy(0.25, &u1);
        u2.axpy(0.25 * dt, &l_u1);

        // Stage 3: u_new = 1/3 * u + 2/3 * u2 + 2/3 * dt * L(u2, t + dt/2)
        let l_u2 = rhs(&u2, t + 0.5 * dt)?;
        state.scale(1.0 / 3.0);
        state.axpy(2.0 / 3.0, &u2);
        state.axpy(2.0 / 3.0 * dt, &l_u2);
        Ok(())
    }
}

// =============================================================================
// Classic RK4
// =============================================================================

/// Classic four-stage Runge-Kutta (4th order).
#[derive(Clone, Copy, Debug, Default)]
pub struct RK4;

impl IntegratorInfo for RK4 {
    fn name(&self) -> &'static str {
        "rk4"
    }

    fn order(&self) -> usize {
        4
    }

    fn n_stages(&self) -> usize {
        4
    }

    fn stage_times(&self, dt: f64) -> Vec<f64> {
        vec![0.0, 0.5 * dt, 0.5 * dt, dt]
    }
}

impl<S: Integrable> TimeIntegrator<S> for RK4 {
    fn step<F, E>(&self, state: &mut S, dt: f64, t: f64, mut rhs: F) -> Result<(), E>
    where
        F: FnMut(&S, f64) -> Result<S, E>,
    {
        let k1 = rhs(state, t)?;

        let mut stage = state.clone();
        stage.axpy(0.5 * dt, &k1);
        let k2 = rhs(&stage, t + 0.5 * dt)?;

        stage.clone_from(state);
        stage.axpy(0.5 * dt, &k2);
        let k3 = rhs(&stage, t + 0.5 * dt)?;

        stage.clone_from(state);
        stage.axpy(dt, &k3);
        let k4 = rhs(&stage, t + dt)?;

        state.axpy(dt / 6.0, &k1);
        state.axpy(dt / 3.0, &k2);
        state.axpy(dt / 3.0, &k3);
        state.axpy(dt / 6.0, &k4);
        Ok(())
    }
}

// =============================================================================
// Standard Integrator Enum
// =============================================================================

/// Built-in integrators, selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardIntegrator {
    ForwardEuler,
    Rk2,
    SspRk3,
    /// Default: classic RK4
    #[default]
    Rk4,
}

impl IntegratorInfo for StandardIntegrator {
    fn name(&self) -> &'static str {
        match self {
            StandardIntegrator::ForwardEuler => ForwardEuler.name(),
            StandardIntegrator::Rk2 => RK2.name(),
            StandardIntegrator::SspRk3 => SSPRK3.name(),
            StandardIntegrator::Rk4 => RK4.name(),
        }
    }

    fn order(&self) -> usize {
        match self {
            StandardIntegrator::ForwardEuler => 1,
            StandardIntegrator::Rk2 => 2,
            StandardIntegrator::SspRk3 => 3,
            StandardIntegrator::Rk4 => 4,
        }
    }

    fn n_stages(&self) -> usize {
        self.order()
    }

    fn stage_times(&self, dt: f64) -> Vec<f64> {
        match self {
            StandardIntegrator::ForwardEuler => ForwardEuler.stage_times(dt),
            StandardIntegrator::Rk2 => RK2.stage_times(dt),
            StandardIntegrator::SspRk3 => SSPRK3.stage_times(dt),
            StandardIntegrator::Rk4 => RK4.stage_times(dt),
        }
    }
}

impl<S: Integrable> TimeIntegrator<S> for StandardIntegrator {
    fn step<F, E>(&self, state: &mut S, dt: f64, t: f64, rhs: F) -> Result<(), E>
    where
        F: FnMut(&S, f64) -> Result<S, E>,
    {
        match self {
            StandardIntegrator::ForwardEuler => ForwardEuler.step(state, dt, t, rhs),
            StandardIntegrator::Rk2 => RK2.step(state, dt, t, rhs),
            StandardIntegrator::SspRk3 => SSPRK3.step(state, dt, t, rhs),
            StandardIntegrator::Rk4 => RK4.step(state, dt, t, rhs),
        }
    }
}
