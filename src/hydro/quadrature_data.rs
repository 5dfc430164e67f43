//! Per-zone, per-quadrature-point state of the Lagrangian hydro operator.
//!
//! Two kinds of data live here:
//!
//! - invariants set once from the initial mesh: ρ₀·det(J₀)·w, J₀⁻¹, the zone
//!   length scale h₀ and the adiabatic index at each point;
//! - derived quantities recomputed on every refresh from the current
//!   position, velocity and energy: density, stress, the weighted stress
//!   consumed by the force assembly and the characteristic speed.
//!
//! The density is never integrated in time. It follows algebraically from
//! the invariant, ρ = ρ₀·det(J₀)·w / (det(J)·w), so mass is conserved
//! pointwise for as long as the invariant is left alone.

use super::tensor::{Tensor2, norm2};
use crate::comm::Communicator;
use crate::equations::{EquationOfState, IdealGas};
use crate::error::{HydroError, Result};
use crate::operators::{GeometricFactors2D, jacobian_at, position_at};
use crate::space::{Discretization, FiniteElementSpace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Local geometry and field values at one point, as seen by a refresh.
#[derive(Clone, Copy, Debug)]
pub struct PointInput {
    /// Jacobian of the current reference-to-physical map.
    pub jacobian: Tensor2,
    /// Reference velocity gradient: [c][b] = ∂v_c/∂ξ_b.
    pub velocity_gradient_ref: Tensor2,
    /// Specific internal energy.
    pub energy: f64,
    /// Physical coordinates.
    pub position: [f64; 2],
}

/// Quantities recomputed at each point by a refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointData {
    /// Cauchy stress σ = -p·I + ν·sym(∇v).
    pub stress: Tensor2,
    /// w·det(J)·σ·J⁻ᵀ, the quantity contracted with reference gradients.
    pub stress_jinvt_w: Tensor2,
    /// Sound speed plus viscous correction, scaled to the initial length h₀.
    pub characteristic_speed: f64,
    /// Artificial viscosity coefficient ν.
    pub viscosity: f64,
    pub density: f64,
    pub det_j: f64,
    pub position: [f64; 2],
}

/// Refresh-invariant data, one entry per point unless noted.
#[derive(Clone, Debug)]
struct PointInvariants {
    n_points: usize,
    /// Reference weights (one per local point).
    weights: Vec<f64>,
    rho0_detj0_w: Vec<f64>,
    jac0_inv: Vec<Tensor2>,
    /// h₀ per zone.
    element_size: Vec<f64>,
    gamma: Vec<f64>,
    use_viscosity: bool,
}

impl PointInvariants {
    fn evaluate(&self, zone: usize, q: usize, input: &PointInput) -> PointData {
        let p = zone * self.n_points + q;
        let jac = input.jacobian;
        let det_j = jac.det();

        let corrupt = !input.energy.is_finite() || !input.velocity_gradient_ref.is_finite();
        if !(det_j > 0.0) || !det_j.is_finite() || corrupt {
            // Tangled zone or non-finite fields: no admissible state; force
            // a rejection.
            return PointData {
                characteristic_speed: f64::INFINITY,
                det_j,
                position: input.position,
                ..PointData::default()
            };
        }

        let w = self.weights[q];
        let rho = self.rho0_detj0_w[p] / (det_j * w);
        let eos = IdealGas::new(self.gamma[p]);
        let pressure = eos.pressure(rho, input.energy);
        let sound_speed = eos.sound_speed(rho, input.energy);

        let jac_inv = jac.inverse();
        let h0 = self.element_size[zone];
        // Current map relative to the initial one.
        let jpi = jac * self.jac0_inv[p];

        let mut stress = Tensor2::IDENTITY.scale(-pressure);
        let mut viscosity = 0.0;

        if self.use_viscosity {
            let sgrad_v = (input.velocity_gradient_ref * jac_inv).sym();
            let (mu, dir) = sgrad_v.min_eigen();
            if mu < 0.0 {
                // Initial length stretched along the compression direction.
                let h = h0 * norm2(jpi.apply(dir)) / norm2(dir);
                viscosity = 2.0 * rho * h * h * mu.abs() + 0.5 * rho * h * sound_speed;
                stress = stress + sgrad_v.scale(viscosity);
            }
        }

        let stretch = jpi.min_singular_value();
        let h_cur = h0 * stretch;
        let characteristic_speed = (sound_speed + 2.5 * viscosity / (rho * h_cur)) / stretch;

        PointData {
            stress,
            stress_jinvt_w: (stress * jac_inv.transpose()).scale(w * det_j),
            characteristic_speed,
            viscosity,
            density: rho,
            det_j,
            position: input.position,
        }
    }
}

/// Lazily refreshed per-point cache.
///
/// The cache remembers the state it was last refreshed from. `ensure_fresh`
/// is a no-op while the cache is valid and is offered that same state, so
/// repeated queries within one stage cost nothing, while every new stage of a
/// multi-stage integrator triggers exactly one refresh.
#[derive(Clone, Debug)]
pub struct QuadratureCache {
    n_zones: usize,
    rule_order: usize,
    inv: PointInvariants,
    points: Vec<PointData>,
    valid: bool,
    /// Concatenated (x, v, e) of the last field refresh; empty otherwise.
    snapshot: Vec<f64>,
    refresh_count: usize,
}

impl QuadratureCache {
    /// Build the cache from the initial position field.
    ///
    /// `rho0` and `gamma` are sampled at the physical quadrature points.
    /// Fails if a zone of the initial mesh is inverted.
    pub fn new(
        disc: &Discretization,
        x0: &[f64],
        rho0: impl Fn([f64; 2]) -> f64,
        gamma: impl Fn([f64; 2]) -> f64,
        use_viscosity: bool,
    ) -> Result<Self> {
        if x0.len() != disc.h1.n_dofs() {
            return Err(HydroError::size_mismatch(
                "initial position",
                disc.h1.n_dofs(),
                x0.len(),
            ));
        }

        let n_zones = disc.n_zones();
        let n_points = disc.n_points();
        let geom = GeometricFactors2D::compute(disc, x0);
        let weights = disc.rule.weights().to_vec();

        let mut rho0_detj0_w = Vec::with_capacity(n_zones * n_points);
        let mut jac0_inv = Vec::with_capacity(n_zones * n_points);
        let mut gammas = Vec::with_capacity(n_zones * n_points);
        let mut local = vec![0.0; 2 * disc.h1.dofs_per_zone()];

        for k in 0..n_zones {
            disc.h1.gather(k, x0, &mut local);
            for q in 0..n_points {
                let det0 = geom.det(k, q);
                if !(det0 > 0.0) {
                    return Err(HydroError::invalid_config(format!(
                        "initial mesh zone {k} is inverted (det J = {det0:.3e})"
                    )));
                }
                let xq = position_at(&disc.h1_shape, q, &local);
                rho0_detj0_w.push(rho0(xq) * det0 * weights[q]);
                jac0_inv.push(geom.jacobian(k, q).inverse());
                gammas.push(gamma(xq));
            }
        }

        let order_v = disc.h1.order() as f64;
        let element_size = (0..n_zones)
            .map(|k| disc.mesh.min_diagonal(k) / (std::f64::consts::SQRT_2 * order_v))
            .collect();

        Self::from_parts(
            disc.rule.order(),
            weights,
            rho0_detj0_w,
            jac0_inv,
            element_size,
            gammas,
            use_viscosity,
        )
    }

    /// Build the cache from explicit invariants.
    ///
    /// Point-indexed vectors have length `n_zones · weights.len()`,
    /// `element_size` has one entry per zone.
    pub fn from_parts(
        rule_order: usize,
        weights: Vec<f64>,
        rho0_detj0_w: Vec<f64>,
        jac0_inv: Vec<Tensor2>,
        element_size: Vec<f64>,
        gamma: Vec<f64>,
        use_viscosity: bool,
    ) -> Result<Self> {
        let n_points = weights.len();
        let n_zones = element_size.len();
        if n_points == 0 || n_zones == 0 {
            return Err(HydroError::invalid_config(
                "quadrature cache needs at least one zone and one point",
            ));
        }
        let total = n_zones * n_points;
        for (what, len) in [
            ("rho0_detj0_w", rho0_detj0_w.len()),
            ("jac0_inv", jac0_inv.len()),
            ("gamma", gamma.len()),
        ] {
            if len != total {
                return Err(HydroError::size_mismatch(what, total, len));
            }
        }

        Ok(Self {
            n_zones,
            rule_order,
            inv: PointInvariants {
                n_points,
                weights,
                rho0_detj0_w,
                jac0_inv,
                element_size,
                gamma,
                use_viscosity,
            },
            points: vec![PointData::default(); total],
            valid: false,
            snapshot: Vec::new(),
            refresh_count: 0,
        })
    }

    #[inline]
    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    /// Points per zone.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.inv.n_points
    }

    #[inline]
    pub fn rule_order(&self) -> usize {
        self.rule_order
    }

    /// Reference weights of the rule.
    pub fn weights(&self) -> &[f64] {
        &self.inv.weights
    }

    /// The mass invariant ρ₀·det(J₀)·w at every point.
    pub fn rho0_detj0_w(&self) -> &[f64] {
        &self.inv.rho0_detj0_w
    }

    /// Initial length scale h₀ of a zone.
    #[inline]
    pub fn element_size(&self, zone: usize) -> f64 {
        self.inv.element_size[zone]
    }

    pub fn use_viscosity(&self) -> bool {
        self.inv.use_viscosity
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of refreshes performed so far.
    #[inline]
    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    #[inline]
    pub fn point(&self, zone: usize, q: usize) -> &PointData {
        &self.points[zone * self.inv.n_points + q]
    }

    /// Points of one zone.
    #[inline]
    pub fn zone_points(&self, zone: usize) -> &[PointData] {
        let n = self.inv.n_points;
        &self.points[zone * n..(zone + 1) * n]
    }

    /// Fail unless shape tables were built on this cache's rule.
    pub fn check_rule_order(&self, order: usize) -> Result<()> {
        if order != self.rule_order {
            return Err(HydroError::QuadratureRuleMismatch {
                expected: self.rule_order,
                actual: order,
            });
        }
        Ok(())
    }

    /// Mark the cache stale.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Refresh unless already valid for exactly this state.
    ///
    /// Returns whether a refresh was performed.
    pub fn ensure_fresh(
        &mut self,
        disc: &Discretization,
        x: &[f64],
        v: &[f64],
        e: &[f64],
    ) -> Result<bool> {
        if self.valid && self.describes(x, v, e) {
            return Ok(false);
        }
        self.refresh(disc, x, v, e)?;
        Ok(true)
    }

    /// Recompute every point from the current fields.
    pub fn refresh(&mut self, disc: &Discretization, x: &[f64], v: &[f64], e: &[f64]) -> Result<()> {
        self.check_rule_order(disc.h1_shape.rule_order())?;
        self.check_rule_order(disc.l2_shape.rule_order())?;
        if disc.n_zones() != self.n_zones || disc.n_points() != self.inv.n_points {
            return Err(HydroError::size_mismatch(
                "quadrature points",
                self.n_zones * self.inv.n_points,
                disc.n_zones() * disc.n_points(),
            ));
        }
        for (what, expected, actual) in [
            ("position", disc.h1.n_dofs(), x.len()),
            ("velocity", disc.h1.n_dofs(), v.len()),
            ("energy", disc.l2.n_dofs(), e.len()),
        ] {
            if expected != actual {
                return Err(HydroError::size_mismatch(what, expected, actual));
            }
        }

        let inv = &self.inv;
        let nd_v = disc.h1.dofs_per_zone();
        let nd_e = disc.l2.dofs_per_zone();

        let refresh_zone = |zone: usize, out: &mut [PointData]| {
            let mut xl = vec![0.0; 2 * nd_v];
            let mut vl = vec![0.0; 2 * nd_v];
            let mut el = vec![0.0; nd_e];
            disc.h1.gather(zone, x, &mut xl);
            disc.h1.gather(zone, v, &mut vl);
            disc.l2.gather(zone, e, &mut el);

            for (q, data) in out.iter_mut().enumerate() {
                let input = PointInput {
                    jacobian: jacobian_at(&disc.h1_shape, q, &xl),
                    velocity_gradient_ref: jacobian_at(&disc.h1_shape, q, &vl),
                    energy: disc.l2_shape.interpolate(q, &el),
                    position: position_at(&disc.h1_shape, q, &xl),
                };
                *data = inv.evaluate(zone, q, &input);
            }
        };

        #[cfg(feature = "parallel")]
        self.points
            .par_chunks_mut(inv.n_points)
            .enumerate()
            .for_each(|(zone, out)| refresh_zone(zone, out));

        #[cfg(not(feature = "parallel"))]
        self.points
            .chunks_mut(inv.n_points)
            .enumerate()
            .for_each(|(zone, out)| refresh_zone(zone, out));

        self.snapshot.clear();
        self.snapshot.extend_from_slice(x);
        self.snapshot.extend_from_slice(v);
        self.snapshot.extend_from_slice(e);
        self.mark_refreshed();
        Ok(())
    }

    /// Recompute every point from externally supplied local data.
    ///
    /// Used when geometry and fields come from outside the built-in spaces.
    /// The cache forgets any field snapshot, so the next `ensure_fresh`
    /// with fields refreshes again.
    pub fn refresh_with(&mut self, mut sample: impl FnMut(usize, usize) -> PointInput) {
        let n_points = self.inv.n_points;
        for zone in 0..self.n_zones {
            for q in 0..n_points {
                let input = sample(zone, q);
                self.points[zone * n_points + q] = self.inv.evaluate(zone, q, &input);
            }
        }
        self.snapshot.clear();
        self.mark_refreshed();
    }

    /// cfl · min over points of h₀ / c, reduced over all partitions.
    ///
    /// Returns +∞ when no point has a positive characteristic speed.
    ///
    /// # Panics
    ///
    /// Panics if the cache is stale.
    pub fn time_step_estimate(&self, cfl: f64, comm: &dyn Communicator) -> f64 {
        assert!(
            self.valid,
            "time step estimate requested from a stale quadrature cache"
        );
        let n_points = self.inv.n_points;
        let mut local_min = f64::INFINITY;
        for (zone, pts) in self.points.chunks(n_points).enumerate() {
            let h0 = self.inv.element_size[zone];
            for pt in pts {
                let c = pt.characteristic_speed;
                if c > 0.0 {
                    local_min = local_min.min(h0 / c);
                }
            }
        }
        comm.min_all(local_min * cfl)
    }

    fn mark_refreshed(&mut self) {
        self.valid = true;
        self.refresh_count += 1;
    }

    fn describes(&self, x: &[f64], v: &[f64], e: &[f64]) -> bool {
        if self.snapshot.len() != x.len() + v.len() + e.len() {
            return false;
        }
        let same = |a: &[f64], b: &[f64]| a.iter().zip(b).all(|(p, q)| p.to_bits() == q.to_bits());
        let (sx, rest) = self.snapshot.split_at(x.len());
        let (sv, se) = rest.split_at(v.len());
        same(sx, x) && same(sv, v) && same(se, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SerialCommunicator;
    use crate::mesh::Mesh2D;
    use approx::assert_relative_eq;

    fn two_point_cache(use_viscosity: bool) -> QuadratureCache {
        QuadratureCache::from_parts(
            1,
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![Tensor2::IDENTITY; 2],
            vec![0.5],
            vec![2.0, 2.0],
            use_viscosity,
        )
        .unwrap()
    }

    fn at_rest(energy: f64) -> impl FnMut(usize, usize) -> PointInput {
        move |_, q| PointInput {
            jacobian: Tensor2::IDENTITY,
            velocity_gradient_ref: Tensor2::ZERO,
            energy,
            position: [q as f64, 0.0],
        }
    }

    #[test]
    fn test_unit_pressure_point() {
        let mut cache = two_point_cache(false);
        cache.refresh_with(at_rest(1.0));

        for q in 0..2 {
            let pt = cache.point(0, q);
            assert_eq!(pt.stress, Tensor2::IDENTITY.scale(-1.0));
            assert_eq!(pt.density, 1.0);
            assert_eq!(pt.characteristic_speed, 2.0_f64.sqrt());
        }
        let dt = cache.time_step_estimate(0.5, &SerialCommunicator);
        assert_eq!(dt, 0.5 / 2.0_f64.sqrt() * 0.5);
    }

    #[test]
    fn test_density_follows_jacobian() {
        let mut cache = two_point_cache(false);
        cache.refresh_with(|_, _| PointInput {
            jacobian: Tensor2::new(2.0, 0.0, 0.0, 1.0),
            velocity_gradient_ref: Tensor2::ZERO,
            energy: 1.0,
            position: [0.0, 0.0],
        });
        assert_relative_eq!(cache.point(0, 0).density, 0.5, epsilon = 1e-15);
        assert_eq!(cache.rho0_detj0_w(), &[1.0, 1.0]);
    }

    #[test]
    fn test_viscosity_only_in_compression() {
        let mut cache = two_point_cache(true);

        // Expansion: ∇v = +I.
        cache.refresh_with(|_, _| PointInput {
            jacobian: Tensor2::IDENTITY,
            velocity_gradient_ref: Tensor2::IDENTITY,
            energy: 1.0,
            position: [0.0, 0.0],
        });
        assert_eq!(cache.point(0, 0).viscosity, 0.0);

        // Compression along x.
        cache.refresh_with(|_, _| PointInput {
            jacobian: Tensor2::IDENTITY,
            velocity_gradient_ref: Tensor2::new(-2.0, 0.0, 0.0, 0.0),
            energy: 1.0,
            position: [0.0, 0.0],
        });
        let pt = *cache.point(0, 0);
        let (rho, h, cs, mu) = (1.0, 0.5, 2.0_f64.sqrt(), 2.0);
        let expected = 2.0 * rho * h * h * mu + 0.5 * rho * h * cs;
        assert_relative_eq!(pt.viscosity, expected, epsilon = 1e-14);
        assert_relative_eq!(pt.stress.get(0, 0), -1.0 - 2.0 * expected, epsilon = 1e-14);
        assert_relative_eq!(pt.stress.get(1, 1), -1.0, epsilon = 1e-14);
        assert!(pt.characteristic_speed > cs);
    }

    #[test]
    fn test_inverted_point_forces_zero_estimate() {
        let mut cache = two_point_cache(false);
        cache.refresh_with(|_, q| PointInput {
            jacobian: if q == 0 {
                Tensor2::new(-1.0, 0.0, 0.0, 1.0)
            } else {
                Tensor2::IDENTITY
            },
            velocity_gradient_ref: Tensor2::ZERO,
            energy: 1.0,
            position: [0.0, 0.0],
        });
        assert_eq!(cache.point(0, 0).characteristic_speed, f64::INFINITY);
        assert_eq!(cache.time_step_estimate(0.5, &SerialCommunicator), 0.0);
    }

    #[test]
    fn test_non_finite_fields_force_zero_estimate() {
        let mut cache = two_point_cache(true);
        cache.refresh_with(|_, q| PointInput {
            jacobian: Tensor2::IDENTITY,
            velocity_gradient_ref: Tensor2::ZERO,
            energy: if q == 0 { f64::NAN } else { 1.0 },
            position: [0.0, 0.0],
        });
        assert_eq!(cache.point(0, 0).characteristic_speed, f64::INFINITY);
        assert_eq!(cache.point(0, 0).stress, Tensor2::ZERO);
        assert_eq!(cache.time_step_estimate(0.5, &SerialCommunicator), 0.0);

        cache.refresh_with(|_, _| PointInput {
            jacobian: Tensor2::IDENTITY,
            velocity_gradient_ref: Tensor2::new(f64::NAN, 0.0, 0.0, 0.0),
            energy: 1.0,
            position: [0.0, 0.0],
        });
        assert_eq!(cache.time_step_estimate(0.5, &SerialCommunicator), 0.0);
    }

    #[test]
    fn test_cold_gas_at_rest_has_infinite_estimate() {
        let mut cache = two_point_cache(false);
        cache.refresh_with(at_rest(0.0));
        assert_eq!(
            cache.time_step_estimate(0.5, &SerialCommunicator),
            f64::INFINITY
        );
    }

    #[test]
    #[should_panic(expected = "stale")]
    fn test_estimate_on_stale_cache_panics() {
        let cache = two_point_cache(false);
        cache.time_step_estimate(0.5, &SerialCommunicator);
    }

    #[test]
    fn test_from_parts_checks_sizes() {
        let err = QuadratureCache::from_parts(
            1,
            vec![1.0, 1.0],
            vec![1.0],
            vec![Tensor2::IDENTITY; 2],
            vec![0.5],
            vec![2.0, 2.0],
            false,
        )
        .unwrap_err();
        assert!(matches!(err, HydroError::SizeMismatch { .. }));
    }

    #[test]
    fn test_ensure_fresh_tracks_state() {
        let mesh = Mesh2D::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 2, 2);
        let disc = Discretization::new(mesh, 2, 1, None).unwrap();
        let x = disc.initial_position();
        let v = vec![0.0; disc.h1.n_dofs()];
        let mut e = vec![1.0; disc.l2.n_dofs()];
        let mut cache = QuadratureCache::new(&disc, &x, |_| 1.0, |_| 1.4, true).unwrap();

        assert!(!cache.is_valid());
        assert!(cache.ensure_fresh(&disc, &x, &v, &e).unwrap());
        assert!(!cache.ensure_fresh(&disc, &x, &v, &e).unwrap());
        assert_eq!(cache.refresh_count(), 1);

        e[0] = 2.0;
        assert!(cache.ensure_fresh(&disc, &x, &v, &e).unwrap());
        cache.invalidate();
        assert!(cache.ensure_fresh(&disc, &x, &v, &e).unwrap());
        assert_eq!(cache.refresh_count(), 3);
    }

    #[test]
    fn test_initial_mass_matches_domain() {
        let mesh = Mesh2D::uniform_rectangle(0.0, 2.0, 0.0, 1.0, 2, 1);
        let disc = Discretization::new(mesh, 2, 1, None).unwrap();
        let x = disc.initial_position();
        let cache = QuadratureCache::new(&disc, &x, |_| 3.0, |_| 1.4, false).unwrap();
        let mass: f64 = cache.rho0_detj0_w().iter().sum();
        assert_relative_eq!(mass, 6.0, epsilon = 1e-12);
        // Unit squares: diagonal √2 over √2·order.
        assert_relative_eq!(cache.element_size(0), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_rule_mismatch_rejected() {
        let mesh = Mesh2D::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 1, 1);
        let disc = Discretization::new(mesh.clone(), 1, 0, Some(3)).unwrap();
        let other = Discretization::new(mesh, 1, 0, Some(2)).unwrap();
        let x = disc.initial_position();
        let mut cache = QuadratureCache::new(&disc, &x, |_| 1.0, |_| 1.4, false).unwrap();
        let v = vec![0.0; other.h1.n_dofs()];
        let e = vec![1.0; other.l2.n_dofs()];
        let err = cache.refresh(&other, &x, &v, &e).unwrap_err();
        assert!(matches!(err, HydroError::QuadratureRuleMismatch { .. }));
    }
}
