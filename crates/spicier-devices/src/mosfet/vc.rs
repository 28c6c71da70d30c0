//! Voltage-controlled (square-law) MOSFET (§4.2.8): nonlinear, three
//! operating regions determined by `(V_gs, V_ds, V_th)`. Stamps residual and
//! Jacobian directly for Newton; falls back to a latched `1/R_on`/`1/R_off`
//! channel conductance for purely linear steps, exactly as the spec
//! prescribes.

use spicier_core::component::{Component, StampContext};
use spicier_core::linalg::{Matrix, Vector};
use spicier_core::mna::MnaSystem;
use spicier_core::NodeId;

use super::MosfetType;
use crate::error::{Result, invalid};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Off,
    Linear,
    Saturation,
}

#[derive(Debug, Clone)]
pub struct VcMosfet {
    pub name: String,
    pub drain: NodeId,
    pub gate: NodeId,
    pub source: NodeId,
    pub mosfet_type: MosfetType,

    v_th: f64,
    k_n: f64,
    lambda: f64,
    r_on: f64,
    r_off: f64,

    region: Region,
}

impl VcMosfet {
    /// Defaults: `V_th = 2.0 V`, `k_n = 2e-4 A/V^2`, `lambda = 0` (disabled).
    pub fn new(name: impl Into<String>, drain: NodeId, gate: NodeId, source: NodeId, mosfet_type: MosfetType) -> Result<Self> {
        Self::with_params(name, drain, gate, source, mosfet_type, 2.0, 2e-4, 0.0, 0.1, 1e9)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_params(
        name: impl Into<String>,
        drain: NodeId,
        gate: NodeId,
        source: NodeId,
        mosfet_type: MosfetType,
        v_th: f64,
        k_n: f64,
        lambda: f64,
        r_on: f64,
        r_off: f64,
    ) -> Result<Self> {
        let name = name.into();
        if !(v_th > 0.0) || !v_th.is_finite() {
            return Err(invalid(&name, "v_th", format!("must be > 0, got {v_th}")));
        }
        if !(k_n > 0.0) || !k_n.is_finite() {
            return Err(invalid(&name, "k_n", format!("must be > 0, got {k_n}")));
        }
        if lambda < 0.0 {
            return Err(invalid(&name, "lambda", format!("must be >= 0, got {lambda}")));
        }
        Ok(VcMosfet {
            name,
            drain,
            gate,
            source,
            mosfet_type,
            v_th,
            k_n,
            lambda,
            r_on,
            r_off,
            region: Region::Off,
        })
    }

    fn sign(&self) -> f64 {
        match self.mosfet_type {
            MosfetType::Nmos => 1.0,
            MosfetType::Pmos => -1.0,
        }
    }

    fn terminal_voltages(&self, x: &Vector, ctx: &StampContext) -> (f64, f64, f64) {
        let vg = ctx.node_index(self.gate).map(|i| x[i]).unwrap_or(0.0);
        let vd = ctx.node_index(self.drain).map(|i| x[i]).unwrap_or(0.0);
        let vs = ctx.node_index(self.source).map(|i| x[i]).unwrap_or(0.0);
        (vg, vd, vs)
    }

    /// `(I_d actual, g_d, g_g, g_s, region)` for the terminal voltages given.
    /// `g_d`/`g_g`/`g_s` are `dI_d/dV_drain`, `dI_d/dV_gate`, `dI_d/dV_source`
    /// of the *actual* (sign-corrected) drain current, derived by chain rule
    /// from the internal (NMOS-oriented) square-law equations — the sign
    /// flip cancels identically for `g_d`/`g_g` and doubles for `g_s`.
    fn evaluate(&self, vg: f64, vd: f64, vs: f64) -> (f64, f64, f64, f64, Region) {
        let sign = self.sign();
        let v_gs = sign * (vg - vs);
        let v_ds = sign * (vd - vs);
        let v_ov = v_gs - self.v_th;

        let (i_internal, g_m, g_ds, region) = if v_ov <= 0.0 {
            (0.0, 0.0, 0.0, Region::Off)
        } else if v_ds < v_ov {
            let base = self.k_n * (v_ov * v_ds - 0.5 * v_ds * v_ds);
            let lam = 1.0 + self.lambda * v_ds;
            let i = base * lam;
            let g_m = self.k_n * v_ds * lam;
            let g_ds = self.k_n * (v_ov - v_ds) * lam + base * self.lambda;
            (i, g_m, g_ds, Region::Linear)
        } else {
            let lam = 1.0 + self.lambda * v_ds;
            let i = 0.5 * self.k_n * v_ov * v_ov * lam;
            let g_m = self.k_n * v_ov * lam;
            let g_ds = 0.5 * self.k_n * v_ov * v_ov * self.lambda;
            (i, g_m, g_ds, Region::Saturation)
        };

        let i_actual = sign * i_internal;
        let g_d = g_ds;
        let g_g = g_m;
        let g_s = -(g_m + g_ds);
        (i_actual, g_d, g_g, g_s, region)
    }
}

impl Component for VcMosfet {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.drain, self.gate, self.source]
    }

    fn is_nonlinear(&self) -> bool {
        true
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        // Linear-step fallback: latched region collapses to a channel
        // conductance, matching the switch-mode device's pattern.
        let drain = ctx.node_index(self.drain);
        let source = ctx.node_index(self.source);
        let r = if self.region == Region::Off { self.r_off } else { self.r_on };
        mna.stamp_conductance(drain, source, 1.0 / r);
    }

    fn stamp_residual(&self, r: &mut Vector, x: &Vector, ctx: &StampContext, _t: f64) {
        let (vg, vd, vs) = self.terminal_voltages(x, ctx);
        let (i, _gd, _gg, _gs, _region) = self.evaluate(vg, vd, vs);
        if let Some(d) = ctx.node_index(self.drain) {
            r.add_at(d, i);
        }
        if let Some(s) = ctx.node_index(self.source) {
            r.add_at(s, -i);
        }
    }

    fn stamp_jacobian(&self, j: &mut Matrix, x: &Vector, ctx: &StampContext, _t: f64) {
        let (vg, vd, vs) = self.terminal_voltages(x, ctx);
        let (_i, g_d, g_g, g_s, _region) = self.evaluate(vg, vd, vs);
        let d = ctx.node_index(self.drain);
        let g = ctx.node_index(self.gate);
        let s = ctx.node_index(self.source);

        if let Some(di) = d {
            j.add_at(di, di, g_d);
            if let Some(gi) = g {
                j.add_at(di, gi, g_g);
            }
            if let Some(si) = s {
                j.add_at(di, si, g_s);
            }
        }
        if let Some(si) = s {
            j.add_at(si, si, -g_s);
            if let Some(di) = d {
                j.add_at(si, di, -g_d);
            }
            if let Some(gi) = g {
                j.add_at(si, gi, -g_g);
            }
        }
    }

    fn event_imminent(&self, x: &Vector, ctx: &StampContext) -> bool {
        let (vg, _vd, vs) = self.terminal_voltages(x, ctx);
        let v_gs = self.sign() * (vg - vs);
        (v_gs - self.v_th).abs() < 0.1
    }

    fn realize_transition(&mut self, x: &Vector, ctx: &StampContext) {
        let (vg, vd, vs) = self.terminal_voltages(x, ctx);
        let (_i, _gd, _gg, _gs, region) = self.evaluate(vg, vd, vs);
        self.region = region;
    }
}
