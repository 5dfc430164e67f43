//! Sedov blast wave.
//!
//! A point energy deposit in a cold gas at rest drives a radially expanding
//! shock. Runs with artificial viscosity on a Q2-Q1 discretization.
//!
//! Usage:
//!   cargo run --release --example sedov [config.toml]
//!
//! Set `RUST_LOG=info` (or `debug`) to see step reports.

use hydro_rs::{FiniteElementSpace, Problem, Simulation, SimulationConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_toml_file(&path)?,
        None => {
            let mut config = SimulationConfig::for_problem(Problem::default());
            config.mesh.zones = Some((16, 16));
            config
        }
    };

    println!("Sedov blast");
    println!("===========");
    println!("{}", config.to_toml_string()?);

    let mut sim = Simulation::new(config)?;
    let h1_dofs = sim.operator().discretization().h1.n_dofs();
    let l2_dofs = sim.operator().discretization().l2.n_dofs();
    println!("Kinematic dofs: {h1_dofs}, thermodynamic dofs: {l2_dofs}");
    println!();

    let result = sim.run_with_callback(|report, state| {
        if report.step % 50 == 0 {
            let v_max = state.v.iter().fold(0.0f64, |m, v| m.max(v.abs()));
            println!(
                "step {:5}  t = {:.5}  dt = {:.4e}  |v|max = {:.4}",
                report.step, report.time, report.dt, v_max
            );
        }
    })?;

    let rho = sim.density()?;
    let rho_max = rho.iter().fold(0.0f64, |m, &r| m.max(r));

    println!();
    println!("Steps: {} ({} rejected)", result.summary.steps, result.summary.rejections);
    println!("Final time: {:.6}", result.summary.final_time);
    println!(
        "dt range: [{:.4e}, {:.4e}]",
        result.summary.dt_min, result.summary.dt_max
    );
    println!("Peak density: {rho_max:.4}");
    println!(
        "Energy: IE {:.8}, KE {:.8}, relative change {:.3e}",
        result.final_energy.internal,
        result.final_energy.kinetic,
        result.energy_drift()
    );
    println!("Wall time: {:.2?}", result.summary.wall_time);

    Ok(())
}
