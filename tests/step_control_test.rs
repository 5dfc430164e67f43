//! Step controller behavior on small model operators.
//!
//! These tests verify the accept/shrink/grow policy independently of the
//! hydro operator:
//! 1. A rejected step is rolled back bit for bit before the retry
//! 2. A permanently unstable operator ends in a fatal collapse
//! 3. dt grows geometrically while the estimate stays large
//! 4. Errors raised inside a stage carry the step context

use hydro_rs::time::{
    ExplicitOperator, RK4, StandardIntegrator, StepControlConfig, StepController, TimeIntegrator,
};
use hydro_rs::{HydroError, Result};

/// du/dt = A u for a rotation-plus-decay A, with a prescribed estimate.
struct Model {
    estimate: f64,
    mult_calls: usize,
    invalidations: usize,
    fail_after: Option<usize>,
}

impl Model {
    fn new(estimate: f64) -> Self {
        Self {
            estimate,
            mult_calls: 0,
            invalidations: 0,
            fail_after: None,
        }
    }
}

fn rhs(u: &[f64]) -> Vec<f64> {
    vec![-0.3 * u[0] + u[1], -u[0] - 0.3 * u[1], -2.0 * u[2]]
}

impl ExplicitOperator<Vec<f64>> for Model {
    fn mult(&mut self, state: &Vec<f64>, _t: f64) -> Result<Vec<f64>> {
        self.mult_calls += 1;
        if self.fail_after.is_some_and(|n| self.mult_calls > n) {
            return Err(HydroError::SolverNotConverged {
                system: "velocity",
                iterations: 300,
                residual: 1.0,
            });
        }
        Ok(rhs(state))
    }

    fn time_step_estimate(&mut self, _state: &Vec<f64>) -> Result<f64> {
        Ok(self.estimate)
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }
}

/// Test that a rejected step leaves no trace in the retried step.
///
/// The state after reject-then-accept must equal the old state advanced
/// directly by the smaller dt.
#[test]
fn test_rejected_step_rolls_back_exactly() {
    let u0 = vec![1.0, 0.5, -0.25];
    let mut u = u0.clone();
    let mut op = Model::new(0.08);
    let mut ctrl = StepController::new(StandardIntegrator::Rk4, StepControlConfig::default(), 10.0)
        .with_initial_dt(0.1);

    let report = ctrl.advance(&mut op, &mut u).unwrap();
    assert_eq!(report.rejections, 2);
    assert_eq!(op.invalidations, 2);
    assert_eq!(report.dt, 0.1 * 0.85 * 0.85);
    assert_eq!(ctrl.steps(), 1);

    let mut expected = u0.clone();
    RK4.step(&mut expected, report.dt, 0.0, |s: &Vec<f64>, _t| {
        Ok::<_, HydroError>(rhs(s))
    })
    .unwrap();
    assert_eq!(u, expected);
    assert_eq!(ctrl.time(), report.dt);
}

/// Test that NaN estimates drive dt to the floor and abort.
#[test]
fn test_unstable_operator_collapses() {
    let mut u = vec![1.0, 0.0, 1.0];
    let mut op = Model::new(f64::NAN);
    let mut ctrl = StepController::new(StandardIntegrator::Rk2, StepControlConfig::default(), 1.0)
        .with_initial_dt(0.01);

    let err = ctrl.run(&mut op, &mut u).unwrap_err();
    match err {
        HydroError::TimeStepCollapse { step, dt, .. } => {
            assert_eq!(step, 1);
            assert!(dt < f64::EPSILON);
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(collapsed_after_bounded_retries(&op));
    assert_eq!(ctrl.steps(), 0);
    assert_eq!(u, vec![1.0, 0.0, 1.0]);
}

fn collapsed_after_bounded_retries(op: &Model) -> bool {
    // ln(ε / 0.01) / ln(0.85) ≈ 193 attempts, two stages each.
    op.invalidations > 150 && op.invalidations < 250 && op.mult_calls == 2 * op.invalidations
}

/// Test that an estimate of zero also ends in a collapse rather than a hang.
#[test]
fn test_zero_estimate_collapses() {
    let mut u = vec![1.0, 0.0, 0.0];
    let mut op = Model::new(0.0);
    let control = StepControlConfig {
        dt_floor: 1e-6,
        ..Default::default()
    };
    let mut ctrl = StepController::new(StandardIntegrator::ForwardEuler, control, 1.0)
        .with_initial_dt(0.1);
    assert!(matches!(
        ctrl.run(&mut op, &mut u),
        Err(HydroError::TimeStepCollapse { .. })
    ));
}

/// Test geometric growth while the estimate exceeds 1.25·dt.
#[test]
fn test_growth_while_estimate_is_large() {
    let mut u = vec![1.0, 0.0, 1.0];
    let mut op = Model::new(1.0);
    let mut ctrl = StepController::new(StandardIntegrator::SspRk3, StepControlConfig::default(), 10.0)
        .with_initial_dt(0.01)
        .with_max_steps(3);

    let mut dts = Vec::new();
    let summary = ctrl
        .run_with_callback(&mut op, &mut u, |report, _| dts.push(report.dt))
        .unwrap();
    assert_eq!(summary.steps, 3);
    assert_eq!(summary.rejections, 0);
    assert_eq!(dts, vec![0.01, 0.01 * 1.02, 0.01 * 1.02 * 1.02]);
}

/// Test that stage failures abort with the step context attached.
#[test]
fn test_stage_failure_is_fatal() {
    let mut u = vec![1.0, 0.0, 1.0];
    let mut op = Model::new(1.0);
    op.fail_after = Some(6);
    let mut ctrl = StepController::new(StandardIntegrator::Rk4, StepControlConfig::default(), 10.0)
        .with_initial_dt(0.1);

    let err = ctrl.run(&mut op, &mut u).unwrap_err();
    assert!(err.is_numerical());
    match err {
        HydroError::StepFailed { step, time, source } => {
            assert_eq!(step, 2);
            assert_eq!(time, 0.1);
            assert!(matches!(*source, HydroError::SolverNotConverged { .. }));
        }
        other => panic!("unexpected error {other}"),
    }
}

/// Test the initial dt when the operator has no finite estimate.
#[test]
fn test_infinite_initial_estimate() {
    let mut u = vec![0.0; 3];
    let mut op = Model::new(f64::INFINITY);
    let mut ctrl = StepController::new(StandardIntegrator::Rk4, StepControlConfig::default(), 0.4);
    let summary = ctrl.run(&mut op, &mut u).unwrap();
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.final_time, 0.4);
}
