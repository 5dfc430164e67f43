//! End-to-end tests of the Lagrangian hydro operator.
//!
//! These tests verify the solver against physical principles:
//! 1. A uniform gas at rest stays at rest
//! 2. The mass invariant survives accepted and rejected steps untouched
//! 3. Total energy is conserved without sources
//! 4. Rejected steps are rolled back exactly on the real operator
//! 5. Collectives reduce across partition threads
//! 6. Configuration files round trip

use std::sync::Arc;
use std::thread;

use approx::assert_relative_eq;
use hydro_rs::comm::{Communicator, SerialCommunicator, ThreadCommunicator};
use hydro_rs::hydro::{HydroOperator, HydroState};
use hydro_rs::space::Discretization;
use hydro_rs::time::{RK4, TimeIntegrator};
use hydro_rs::{HydroError, Problem, Simulation, SimulationConfig};

fn small_config(problem: Problem, zones: usize) -> SimulationConfig {
    let mut config = SimulationConfig::for_problem(problem);
    config.mesh.zones = Some((zones, zones));
    config
}

fn uniform(energy: f64) -> Problem {
    Problem::Uniform {
        density: 1.0,
        energy,
        gamma: 1.4,
    }
}

/// Test that a uniform gas at rest does not move.
#[test]
fn test_uniform_state_stays_at_rest() {
    let mut config = small_config(uniform(2.0), 3);
    config.time.t_final = Some(0.2);
    let mut sim = Simulation::new(config).unwrap();
    let e0 = sim.state().e.clone();
    let x0 = sim.state().x.clone();

    let result = sim.run().unwrap();
    assert!(result.summary.reached_final_time);
    assert_eq!(result.summary.rejections, 0);

    let state = sim.state();
    assert!(state.v.iter().all(|v| v.abs() < 1e-10));
    for (a, b) in state.x.iter().zip(&x0) {
        assert_relative_eq!(a, b, epsilon = 1e-10);
    }
    for (a, b) in state.e.iter().zip(&e0) {
        assert_relative_eq!(a, b, epsilon = 1e-10);
    }
}

/// Test that ρ₀·det(J₀)·w is untouched by accepted and rejected steps.
#[test]
fn test_mass_invariant_survives_rejections() {
    let reference = Simulation::new(small_config(Problem::default(), 4)).unwrap();
    let (mut op, s0) = reference_operator(reference);
    let estimate = op.time_step_estimate(&s0).unwrap();

    let mut config = small_config(Problem::default(), 4);
    config.time.initial_dt = Some(3.0 * estimate);
    config.time.max_steps = Some(3);
    let mut sim = Simulation::new(config).unwrap();
    let before = sim.operator().cache().rho0_detj0_w().to_vec();

    let result = sim.run().unwrap();
    assert_eq!(result.summary.steps, 3);
    assert!(result.summary.rejections > 0);
    assert_eq!(sim.operator().cache().rho0_detj0_w(), before.as_slice());
    assert!(sim.state().is_finite());
}

fn reference_operator(sim: Simulation) -> (HydroOperator, HydroState) {
    let state = sim.state().clone();
    let config = sim.config().clone();
    let problem = &config.problem;
    let mesh = problem.mesh(config.mesh.zones).unwrap();
    let disc = Discretization::new(mesh, 2, 1, None).unwrap();
    let cache = problem
        .quadrature_cache(&disc, &state.x, problem.use_viscosity())
        .unwrap();
    let op = HydroOperator::new(disc, cache, Arc::new(SerialCommunicator)).unwrap();
    (op, state)
}

/// Test that a rejected step on the hydro operator is rolled back bit for bit.
#[test]
fn test_hydro_rollback_is_exact() {
    let reference = Simulation::new(small_config(Problem::default(), 4)).unwrap();
    let (mut op, s0) = reference_operator(reference);
    let estimate = op.time_step_estimate(&s0).unwrap();

    let mut config = small_config(Problem::default(), 4);
    config.time.initial_dt = Some(2.0 * estimate);
    let mut sim = Simulation::new(config).unwrap();
    let report = sim.step().unwrap();
    assert!(report.rejections > 0);

    let mut expected = s0.clone();
    op.invalidate();
    RK4.step(&mut expected, report.dt, 0.0, |s: &HydroState, t| op.mult(s, t))
    .unwrap();
    assert_eq!(sim.state(), &expected);
}

/// Test total energy conservation of the smooth Gresho vortex.
#[test]
fn test_energy_conservation_gresho() {
    let mut config = small_config(Problem::Gresho, 4);
    config.time.max_steps = Some(5);
    let mut sim = Simulation::new(config).unwrap();
    let result = sim.run().unwrap();

    assert!(result.initial_energy.kinetic > 0.0);
    assert!(result.energy_drift().abs() < 1e-3);
}

/// Test total energy conservation of the Sedov blast with viscosity on.
#[test]
fn test_energy_conservation_sedov() {
    let mut config = small_config(Problem::default(), 4);
    config.time.max_steps = Some(10);
    let mut sim = Simulation::new(config).unwrap();
    let result = sim.run().unwrap();

    assert_relative_eq!(result.initial_energy.internal, 0.25, epsilon = 1e-12);
    assert!(result.final_energy.kinetic > 0.0);
    assert!(result.energy_drift().abs() < 1e-2);
}

/// Test that the Taylor-Green source feeds energy into the flow.
#[test]
fn test_taylor_green_runs_with_source() {
    let mut config = small_config(Problem::TaylorGreen, 4);
    config.time.max_steps = Some(3);
    let mut sim = Simulation::new(config).unwrap();
    let result = sim.run().unwrap();
    assert_eq!(result.summary.steps, 3);
    assert!(sim.state().is_finite());

    let rho = sim.density().unwrap();
    assert!(rho.iter().all(|&r| r > 0.5 && r < 1.5));
}

/// Test collectives across two partition threads.
///
/// Each partition holds a different uniform gas; the time step is the
/// minimum and energies are summed.
#[test]
fn test_thread_partitions_reduce() {
    let energies = [1.0, 4.0];
    let serial: Vec<(f64, f64)> = energies
        .iter()
        .map(|&e| {
            let mut sim = Simulation::new(small_config(uniform(e), 2)).unwrap();
            let state = sim.state().clone();
            let dt = sim.operator_mut().time_step_estimate(&state).unwrap();
            (dt, sim.energy().internal)
        })
        .collect();

    let comms = ThreadCommunicator::group(2);
    let results: Vec<(f64, f64)> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let e = energies[comm.rank()];
                    let comm: Arc<dyn Communicator> = Arc::new(comm);
                    let mut sim =
                        Simulation::with_communicator(small_config(uniform(e), 2), comm).unwrap();
                    let state = sim.state().clone();
                    let dt = sim.operator_mut().time_step_estimate(&state).unwrap();
                    (dt, sim.energy().internal)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let dt_min = serial[0].0.min(serial[1].0);
    let ie_sum = serial[0].1 + serial[1].1;
    for (dt, ie) in results {
        assert_eq!(dt, dt_min);
        assert_relative_eq!(ie, ie_sum, epsilon = 1e-12);
    }
}

/// Test that a corrupted energy field cannot produce an acceptable step.
#[test]
fn test_nan_energy_forces_zero_estimate() {
    let mut sim = Simulation::new(small_config(uniform(1.0), 2)).unwrap();
    let mut state = sim.state().clone();
    state.e[0] = f64::NAN;
    let dt = sim.operator_mut().time_step_estimate(&state).unwrap();
    assert_eq!(dt, 0.0);
}

/// Test config file round trip through a temporary file.
#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sedov.toml");

    let mut config = small_config(Problem::default(), 6);
    config.discretization.order_v = 3;
    config.discretization.order_e = 2;
    config.time.cfl = 0.25;
    config.viscosity = Some(false);
    config.to_toml_file(&path).unwrap();

    let back = SimulationConfig::from_toml_file(&path).unwrap();
    assert_eq!(back, config);
    assert!(!back.use_viscosity());
}

/// Test that a missing config file is an IO error.
#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = SimulationConfig::from_toml_file(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, HydroError::Io(_)));
}

/// Test that parallel assembly reproduces zone-by-zone assembly exactly.
#[cfg(feature = "parallel")]
#[test]
fn test_parallel_assembly_matches_zonewise() {
    use hydro_rs::operators::ForceAssembler;

    let sim = Simulation::new(small_config(Problem::TaylorGreen, 4)).unwrap();
    let (mut op, state) = reference_operator(sim);
    op.mult(&state, 0.0).unwrap();

    let assembler = ForceAssembler::new(op.discretization());
    let force = assembler.assemble(op.cache()).unwrap();
    for z in 0..op.discretization().n_zones() {
        let local = assembler.assemble_local(op.cache(), z).unwrap();
        assert_eq!(force.block(z), &local);
    }

    let first = op.mult(&state, 0.0).unwrap();
    op.invalidate();
    let second = op.mult(&state, 0.0).unwrap();
    assert_eq!(first, second);
}
