//! Benchmarks for the hydro operator kernels.
//!
//! Run with: `cargo bench --bench hydro_bench`
//!
//! Benchmarks cache refresh, mass operator action and the full right-hand
//! side on the Sedov and Taylor-Green setups.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hydro_rs::comm::SerialCommunicator;
use hydro_rs::hydro::{HydroOperator, HydroState, QuadratureCache};
use hydro_rs::operators::MassOperator;
use hydro_rs::problems::Problem;
use hydro_rs::space::{Discretization, FiniteElementSpace};

/// Setup a test problem.
fn setup_problem(
    problem: &Problem,
    n: usize,
    order_v: usize,
) -> (Discretization, QuadratureCache, HydroState) {
    let mesh = problem.mesh(Some((n, n))).unwrap();
    let disc = Discretization::new(mesh, order_v, order_v - 1, None).unwrap();
    let state = problem.initial_state(&disc).unwrap();
    let cache = problem
        .quadrature_cache(&disc, &state.x, problem.use_viscosity())
        .unwrap();
    (disc, cache, state)
}

/// Benchmark the per-point refresh of the quadrature cache.
fn bench_cache_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_refresh");
    let problem = Problem::TaylorGreen;

    for n in [8, 16, 32] {
        let (disc, mut cache, state) = setup_problem(&problem, n, 2);
        group.bench_with_input(BenchmarkId::new("q2q1", format!("{}_zones", n * n)), &n, |b, _| {
            b.iter(|| {
                cache
                    .refresh(&disc, &state.x, &state.v, &state.e)
                    .unwrap();
                black_box(cache.refresh_count())
            })
        });
    }

    group.finish();
}

/// Benchmark the matrix-free kinematic mass action.
fn bench_mass_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("mass_apply");
    let problem = Problem::default();

    for order in [1, 2, 3] {
        let (disc, cache, _) = setup_problem(&problem, 16, order);
        let mut mass = MassOperator::new(&disc.h1, &disc.h1_shape);
        mass.setup(&cache).unwrap();
        mass.set_essential_dofs(&disc.essential_dofs(), &SerialCommunicator)
            .unwrap();

        let x: Vec<f64> = (0..mass.n_dofs()).map(|i| (i as f64 * 0.1).sin()).collect();
        let mut y = vec![0.0; mass.n_dofs()];

        group.bench_with_input(BenchmarkId::new("kinematic", format!("order_{order}")), &order, |b, _| {
            b.iter(|| {
                mass.mult(black_box(&x), &mut y);
                black_box(y[0])
            })
        });
    }

    group.finish();
}

/// Benchmark one full right-hand-side evaluation.
fn bench_operator_mult(c: &mut Criterion) {
    let mut group = c.benchmark_group("operator_mult");
    group.sample_size(20);

    for problem in [Problem::default(), Problem::TaylorGreen] {
        let (disc, cache, state) = setup_problem(&problem, 16, 2);
        let n_dofs = disc.h1.n_dofs();
        let mut op = HydroOperator::new(disc, cache, Arc::new(SerialCommunicator)).unwrap();
        if let Some(source) = problem.energy_source() {
            op = op.with_energy_source(source);
        }

        group.bench_with_input(BenchmarkId::new(problem.name(), format!("{n_dofs}_dofs")), &n_dofs, |b, _| {
            b.iter(|| {
                op.invalidate();
                black_box(op.mult(&state, 0.0).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cache_refresh, bench_mass_apply, bench_operator_mult);
criterion_main!(benches);
