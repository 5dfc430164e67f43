//! Generalized force: coupling of the kinematic and thermodynamic spaces.
//!
//! For zone z the local force block is
//!
//! F[j, (c,i)] = Σ_q φᵉ_j(ξ_q) · Σ_b S_q[c][b] · ∂φ_i/∂ξ_b(ξ_q),   S_q = w·det(J)·σ·J⁻ᵀ
//!
//! i.e. ∫ (σ : ∇φ_i) φᵉ_j dx. Rows run over thermodynamic dofs, columns over
//! the component-major kinematic dofs c·n_v + i. The global operator is only
//! ever applied block by block.

use crate::basis::ShapeTable;
use crate::error::{HydroError, Result};
use crate::hydro::QuadratureCache;
use crate::space::{Discretization, FiniteElementSpace};
use faer::Mat;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Builds local force blocks and the density/source right-hand sides.
#[derive(Clone)]
pub struct ForceAssembler {
    h1_shape: ShapeTable,
    l2_shape: ShapeTable,
    n_zones: usize,
    n_h1_scalar: usize,
    n_l2: usize,
    h1_zone_dofs: Vec<usize>,
    l2_zone_dofs: Vec<usize>,
}

impl ForceAssembler {
    pub fn new(disc: &Discretization) -> Self {
        let n_zones = disc.n_zones();
        let mut h1_zone_dofs = Vec::with_capacity(n_zones * disc.h1.dofs_per_zone());
        let mut l2_zone_dofs = Vec::with_capacity(n_zones * disc.l2.dofs_per_zone());
        for z in 0..n_zones {
            h1_zone_dofs.extend_from_slice(disc.h1.zone_dofs(z));
            l2_zone_dofs.extend_from_slice(disc.l2.zone_dofs(z));
        }

        Self {
            h1_shape: disc.h1_shape.clone(),
            l2_shape: disc.l2_shape.clone(),
            n_zones,
            n_h1_scalar: disc.h1.n_scalar_dofs(),
            n_l2: disc.l2.n_dofs(),
            h1_zone_dofs,
            l2_zone_dofs,
        }
    }

    /// Thermodynamic dofs per zone.
    #[inline]
    pub fn n_thermo_local(&self) -> usize {
        self.l2_shape.n_dofs()
    }

    /// Kinematic dofs per zone (all components).
    #[inline]
    pub fn n_kinematic_local(&self) -> usize {
        2 * self.h1_shape.n_dofs()
    }

    fn check(&self, cache: &QuadratureCache) -> Result<()> {
        cache.check_rule_order(self.h1_shape.rule_order())?;
        cache.check_rule_order(self.l2_shape.rule_order())?;
        if cache.n_zones() != self.n_zones {
            return Err(HydroError::size_mismatch("zones", self.n_zones, cache.n_zones()));
        }
        Ok(())
    }

    /// Local force block of one zone.
    pub fn assemble_local(&self, cache: &QuadratureCache, zone: usize) -> Result<Mat<f64>> {
        self.check(cache)?;
        let nd_v = self.h1_shape.n_dofs();
        let nd_e = self.l2_shape.n_dofs();
        let mut f = Mat::zeros(nd_e, 2 * nd_v);

        for (q, pt) in cache.zone_points(zone).iter().enumerate() {
            let s = pt.stress_jinvt_w;
            let grads = self.h1_shape.grads(q);
            let phi_e = self.l2_shape.values(q);

            for (i, g) in grads.iter().enumerate() {
                // (σ : ∇φ_i) for each velocity component.
                let sx = s.get(0, 0) * g[0] + s.get(0, 1) * g[1];
                let sy = s.get(1, 0) * g[0] + s.get(1, 1) * g[1];
                for (j, &e) in phi_e.iter().enumerate() {
                    f[(j, i)] += e * sx;
                    f[(j, nd_v + i)] += e * sy;
                }
            }
        }
        Ok(f)
    }

    /// Local blocks of every zone, ready to apply.
    pub fn assemble(&self, cache: &QuadratureCache) -> Result<ForceOperator<'_>> {
        self.check(cache)?;

        #[cfg(feature = "parallel")]
        let blocks = (0..self.n_zones)
            .into_par_iter()
            .map(|z| self.assemble_local(cache, z))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let blocks = (0..self.n_zones)
            .map(|z| self.assemble_local(cache, z))
            .collect::<Result<Vec<_>>>()?;

        Ok(ForceOperator {
            assembler: self,
            blocks,
        })
    }

    /// Σ_q ρ₀·det(J₀)·w · φᵉ_j: the zone mass tested against the thermodynamic basis.
    pub fn assemble_rhs_density(&self, cache: &QuadratureCache, zone: usize) -> Result<Vec<f64>> {
        self.check(cache)?;
        let nq = cache.n_points();
        let invariant = &cache.rho0_detj0_w()[zone * nq..(zone + 1) * nq];
        let mut rhs = vec![0.0; self.l2_shape.n_dofs()];
        for (q, &m) in invariant.iter().enumerate() {
            for (r, &phi) in rhs.iter_mut().zip(self.l2_shape.values(q)) {
                *r += m * phi;
            }
        }
        Ok(rhs)
    }

    /// Σ_q w·det(J)·f(x_q) · φᵉ_j on the current geometry.
    pub fn assemble_rhs_source(
        &self,
        cache: &QuadratureCache,
        zone: usize,
        f: impl Fn([f64; 2]) -> f64,
    ) -> Result<Vec<f64>> {
        self.check(cache)?;
        let weights = cache.weights();
        let mut rhs = vec![0.0; self.l2_shape.n_dofs()];
        for (q, pt) in cache.zone_points(zone).iter().enumerate() {
            let wf = weights[q] * pt.det_j * f(pt.position);
            for (r, &phi) in rhs.iter_mut().zip(self.l2_shape.values(q)) {
                *r += wf * phi;
            }
        }
        Ok(rhs)
    }

    /// Global energy source vector, scattered through the thermodynamic dofs.
    pub fn assemble_source(
        &self,
        cache: &QuadratureCache,
        f: impl Fn([f64; 2]) -> f64,
    ) -> Result<Vec<f64>> {
        let nd_e = self.l2_shape.n_dofs();
        let mut out = vec![0.0; self.n_l2];
        for z in 0..self.n_zones {
            let local = self.assemble_rhs_source(cache, z, &f)?;
            for (&d, v) in self.l2_zone_dofs[z * nd_e..(z + 1) * nd_e].iter().zip(local) {
                out[d] += v;
            }
        }
        Ok(out)
    }
}

/// Zone-wise force operator F: kinematic → thermodynamic.
pub struct ForceOperator<'a> {
    assembler: &'a ForceAssembler,
    blocks: Vec<Mat<f64>>,
}

impl ForceOperator<'_> {
    /// Local block of one zone.
    pub fn block(&self, zone: usize) -> &Mat<f64> {
        &self.blocks[zone]
    }

    /// F·v, a thermodynamic vector.
    pub fn mult(&self, v: &[f64]) -> Vec<f64> {
        let a = self.assembler;
        let nd_v = a.h1_shape.n_dofs();
        let nd_e = a.l2_shape.n_dofs();
        let mut out = vec![0.0; a.n_l2];
        let mut vl = vec![0.0; 2 * nd_v];

        for (z, f) in self.blocks.iter().enumerate() {
            let h1_dofs = &a.h1_zone_dofs[z * nd_v..(z + 1) * nd_v];
            for (i, &d) in h1_dofs.iter().enumerate() {
                vl[i] = v[d];
                vl[nd_v + i] = v[a.n_h1_scalar + d];
            }
            let l2_dofs = &a.l2_zone_dofs[z * nd_e..(z + 1) * nd_e];
            for (j, &d) in l2_dofs.iter().enumerate() {
                out[d] += (0..2 * nd_v).map(|k| f[(j, k)] * vl[k]).sum::<f64>();
            }
        }
        out
    }

    /// Fᵀ·u, a kinematic vector.
    pub fn mult_transpose(&self, u: &[f64]) -> Vec<f64> {
        let a = self.assembler;
        let nd_v = a.h1_shape.n_dofs();
        let nd_e = a.l2_shape.n_dofs();
        let mut out = vec![0.0; 2 * a.n_h1_scalar];

        for (z, f) in self.blocks.iter().enumerate() {
            let l2_dofs = &a.l2_zone_dofs[z * nd_e..(z + 1) * nd_e];
            let h1_dofs = &a.h1_zone_dofs[z * nd_v..(z + 1) * nd_v];
            for (i, &d) in h1_dofs.iter().enumerate() {
                let (mut rx, mut ry) = (0.0, 0.0);
                for (j, &e) in l2_dofs.iter().enumerate() {
                    rx += f[(j, i)] * u[e];
                    ry += f[(j, nd_v + i)] * u[e];
                }
                out[d] += rx;
                out[a.n_h1_scalar + d] += ry;
            }
        }
        out
    }
}
