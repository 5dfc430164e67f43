//! Adaptive explicit time stepping with rollback.
//!
//! Each outer iteration advances the state by one step of the configured
//! integrator and then asks the operator for a new stable step estimate.
//! If the estimate is smaller than the step just taken (or NaN), the step is
//! discarded: the saved state is restored bit for bit, dt is shrunk and the
//! operator is told to forget anything it cached. Otherwise the step is
//! accepted and dt may grow a little for the next one.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::integrator::{Integrable, IntegratorInfo, StandardIntegrator, TimeIntegrator};
use crate::error::{HydroError, Result};

// =============================================================================
// ExplicitOperator Trait
// =============================================================================

/// Right-hand side of dS/dt = F(S, t) with a stability estimate.
pub trait ExplicitOperator<S: Integrable> {
    /// Evaluate dS/dt at (state, t).
    fn mult(&mut self, state: &S, t: f64) -> Result<S>;

    /// Largest stable step for `state`.
    fn time_step_estimate(&mut self, state: &S) -> Result<f64>;

    /// Drop any state-derived data cached between calls.
    fn invalidate(&mut self);
}

// =============================================================================
// Step Control Configuration
// =============================================================================

/// Constants of the accept/shrink/grow policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepControlConfig {
    /// dt factor applied on rejection.
    pub shrink: f64,
    /// Grow when dt_est exceeds this multiple of dt.
    pub grow_threshold: f64,
    /// dt factor applied when growing.
    pub grow: f64,
    /// Rejection below this dt is fatal.
    pub dt_floor: f64,
    /// Constant dt; disables growth but not rejection.
    pub fixed_dt: Option<f64>,
}

impl Default for StepControlConfig {
    fn default() -> Self {
        Self {
            shrink: 0.85,
            grow_threshold: 1.25,
            grow: 1.02,
            dt_floor: f64::EPSILON,
            fixed_dt: None,
        }
    }
}

impl StepControlConfig {
    /// Check that the factors make sense.
    pub fn validate(&self) -> Result<()> {
        if !(self.shrink > 0.0 && self.shrink < 1.0) {
            return Err(HydroError::invalid_config(format!(
                "step_control.shrink must lie in (0, 1), got {}",
                self.shrink
            )));
        }
        if !(self.grow >= 1.0) {
            return Err(HydroError::invalid_config(format!(
                "step_control.grow must be >= 1, got {}",
                self.grow
            )));
        }
        if !(self.grow_threshold >= 1.0) {
            return Err(HydroError::invalid_config(format!(
                "step_control.grow_threshold must be >= 1, got {}",
                self.grow_threshold
            )));
        }
        if !(self.dt_floor > 0.0) {
            return Err(HydroError::invalid_config(format!(
                "step_control.dt_floor must be positive, got {}",
                self.dt_floor
            )));
        }
        if let Some(dt) = self.fixed_dt
            && !(dt > 0.0)
        {
            return Err(HydroError::invalid_config(format!(
                "step_control.fixed_dt must be positive, got {dt}"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Reports
// =============================================================================

/// One accepted step.
#[derive(Clone, Copy, Debug)]
pub struct StepReport {
    /// 1-based index of the accepted step.
    pub step: usize,
    /// Time after the step.
    pub time: f64,
    /// Step size actually used.
    pub dt: f64,
    /// Operator estimate after the step.
    pub dt_estimate: f64,
    /// Step size proposed for the next step.
    pub next_dt: f64,
    /// Attempts discarded before this step was accepted.
    pub rejections: usize,
}

/// Statistics of a completed run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub steps: usize,
    pub rejections: usize,
    pub final_time: f64,
    pub dt_min: f64,
    pub dt_max: f64,
    pub wall_time: Duration,
    /// False when the run stopped on the step limit.
    pub reached_final_time: bool,
}

// =============================================================================
// Step Controller
// =============================================================================

/// Drives an [`ExplicitOperator`] from the start time to `t_final`.
#[derive(Clone, Debug)]
pub struct StepController {
    integrator: StandardIntegrator,
    control: StepControlConfig,
    t_final: f64,
    max_steps: Option<usize>,
    report_interval: usize,
    t: f64,
    dt: Option<f64>,
    steps: usize,
    rejections: usize,
}

impl StepController {
    pub fn new(integrator: StandardIntegrator, control: StepControlConfig, t_final: f64) -> Self {
        let dt = control.fixed_dt;
        Self {
            integrator,
            control,
            t_final,
            max_steps: None,
            report_interval: 0,
            t: 0.0,
            dt,
            steps: 0,
            rejections: 0,
        }
    }

    /// Stop after this many accepted steps.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Initial dt; otherwise taken from the operator estimate.
    pub fn with_initial_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Log progress every `interval` steps (0 disables).
    pub fn with_report_interval(mut self, interval: usize) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_start_time(mut self, t: f64) -> Self {
        self.t = t;
        self
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Current (or next) step size, once known.
    #[inline]
    pub fn dt(&self) -> Option<f64> {
        self.dt
    }

    /// Accepted steps so far.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Discarded attempts so far.
    #[inline]
    pub fn rejections(&self) -> usize {
        self.rejections
    }

    pub fn integrator(&self) -> StandardIntegrator {
        self.integrator
    }

    pub fn is_finished(&self) -> bool {
        self.t >= self.t_final || self.max_steps.is_some_and(|n| self.steps >= n)
    }

    /// Determine the initial dt if none was configured.
    pub fn initialize<S, O>(&mut self, op: &mut O, state: &S) -> Result<f64>
    where
        S: Integrable,
        O: ExplicitOperator<S> + ?Sized,
    {
        if let Some(dt) = self.dt {
            return Ok(dt);
        }
        let remaining = self.t_final - self.t;
        let mut dt = op.time_step_estimate(state)?;
        if dt.is_infinite() {
            dt = remaining;
        }
        if !(dt > 0.0) {
            log::error!("Initial time step estimate {dt:.3e} is not positive");
            return Err(HydroError::TimeStepCollapse {
                time: self.t,
                step: self.steps,
                dt,
            });
        }
        self.dt = Some(dt);
        Ok(dt)
    }

    /// Take one accepted step, retrying with smaller dt as needed.
    ///
    /// Returns [`HydroError::RunFinished`] without touching the state once
    /// the final time or the step limit has been reached.
    pub fn advance<S, O>(&mut self, op: &mut O, state: &mut S) -> Result<StepReport>
    where
        S: Integrable,
        O: ExplicitOperator<S> + ?Sized,
    {
        if self.is_finished() {
            return Err(HydroError::RunFinished {
                time: self.t,
                steps: self.steps,
            });
        }
        let mut dt = self.initialize(op, state)?;
        let mut rejected = 0;
        let saved = state.clone();

        loop {
            let t_old = self.t;
            let last_step = t_old + dt >= self.t_final;
            if last_step {
                dt = self.t_final - t_old;
            }

            let step_index = self.steps + 1;
            self.integrator
                .step(state, dt, t_old, |s, time| op.mult(s, time))
                .map_err(|e| e.in_step(step_index, t_old))?;

            let dt_est = op
                .time_step_estimate(state)
                .map_err(|e| e.in_step(step_index, t_old))?;

            if dt_est.is_nan() || dt_est < dt {
                state.clone_from(&saved);
                dt *= self.control.shrink;
                op.invalidate();
                rejected += 1;
                self.rejections += 1;
                log::warn!(
                    "Repeating step {step_index} at t = {t_old:.6e}: dt_est = {dt_est:.3e}, retrying with dt = {dt:.3e}"
                );
                if dt < self.control.dt_floor {
                    log::error!(
                        "Time step collapsed to {dt:.3e} at t = {t_old:.6e} (step {step_index})"
                    );
                    return Err(HydroError::TimeStepCollapse {
                        time: t_old,
                        step: step_index,
                        dt,
                    });
                }
                continue;
            }

            self.t = if last_step { self.t_final } else { t_old + dt };
            self.steps = step_index;

            let grows = self.control.fixed_dt.is_none()
                && dt_est > self.control.grow_threshold * dt;
            let next_dt = if grows { dt * self.control.grow } else { dt };
            // A clamped final step must not shrink the remembered dt.
            let remembered = self.dt.unwrap_or(dt);
            self.dt = Some(if last_step { remembered.max(next_dt) } else { next_dt });

            let report = StepReport {
                step: step_index,
                time: self.t,
                dt,
                dt_estimate: dt_est,
                next_dt,
                rejections: rejected,
            };
            if self.report_interval > 0 && (step_index % self.report_interval == 0 || last_step) {
                log::debug!(
                    "step {:5}, t = {:.4e}, dt = {:.4e}, dt_est = {:.4e}",
                    report.step,
                    report.time,
                    report.dt,
                    report.dt_estimate
                );
            }
            return Ok(report);
        }
    }

    /// Run to the final time or the step limit.
    pub fn run<S, O>(&mut self, op: &mut O, state: &mut S) -> Result<RunSummary>
    where
        S: Integrable,
        O: ExplicitOperator<S> + ?Sized,
    {
        self.run_with_callback(op, state, |_, _| {})
    }

    /// Run, calling `callback` after every accepted step.
    pub fn run_with_callback<S, O, C>(
        &mut self,
        op: &mut O,
        state: &mut S,
        mut callback: C,
    ) -> Result<RunSummary>
    where
        S: Integrable,
        O: ExplicitOperator<S> + ?Sized,
        C: FnMut(&StepReport, &S),
    {
        let start_wall = Instant::now();
        let start_rejections = self.rejections;
        let start_steps = self.steps;
        let mut dt_min = f64::INFINITY;
        let mut dt_max: f64 = 0.0;

        log::info!(
            "Starting run: t = {:.4e} -> {:.4e} with {}",
            self.t,
            self.t_final,
            self.integrator.name()
        );

        while !self.is_finished() {
            let report = self.advance(op, state)?;
            dt_min = dt_min.min(report.dt);
            dt_max = dt_max.max(report.dt);
            callback(&report, state);
        }

        let summary = RunSummary {
            steps: self.steps - start_steps,
            rejections: self.rejections - start_rejections,
            final_time: self.t,
            dt_min,
            dt_max,
            wall_time: start_wall.elapsed(),
            reached_final_time: self.t >= self.t_final,
        };

        log::info!(
            "Run finished: {} steps ({} rejected attempts), t = {:.4e}, dt in [{:.3e}, {:.3e}], {:.2?}",
            summary.steps,
            summary.rejections,
            summary.final_time,
            summary.dt_min,
            summary.dt_max,
            summary.wall_time
        );
        Ok(summary)
    }
}
