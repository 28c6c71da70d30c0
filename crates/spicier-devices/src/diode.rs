//! Shockley diode (§4.2.9), nonlinear: stamps residual/Jacobian directly.

use spicier_core::component::{Component, StampContext};
use spicier_core::linalg::{Matrix, Vector};
use spicier_core::NodeId;

use crate::error::{Result, invalid};

/// Thermal voltage `kT/q` at room temperature (300 K), used as the default
/// when no explicit temperature is supplied.
pub const DEFAULT_THERMAL_VOLTAGE: f64 = 0.025852;

/// `I = I_s * (exp(V_d / (n*V_t)) - 1)`, `V_d` clamped to `v_max` above which
/// the exponential is linearly extrapolated to avoid overflow during Newton
/// iterations that briefly overshoot.
#[derive(Debug, Clone)]
pub struct Diode {
    pub name: String,
    pub anode: NodeId,
    pub cathode: NodeId,
    i_s: f64,
    n: f64,
    v_t: f64,
    v_max: f64,
    g_min: f64,
}

impl Diode {
    /// Defaults per the spec's adopted parameter table: `I_s = 1e-14 A`,
    /// `n = 1.0`, `V_max = 0.8 V`, `G_min = 1e-12 S`.
    pub fn new(name: impl Into<String>, anode: NodeId, cathode: NodeId) -> Result<Self> {
        Self::with_params(name, anode, cathode, 1e-14, 1.0, DEFAULT_THERMAL_VOLTAGE, 0.8, 1e-12)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_params(
        name: impl Into<String>,
        anode: NodeId,
        cathode: NodeId,
        i_s: f64,
        n: f64,
        v_t: f64,
        v_max: f64,
        g_min: f64,
    ) -> Result<Self> {
        let name = name.into();
        if !(i_s > 0.0) || !i_s.is_finite() {
            return Err(invalid(&name, "i_s", format!("must be > 0, got {i_s}")));
        }
        if !(n > 0.0) || !n.is_finite() {
            return Err(invalid(&name, "n", format!("must be > 0, got {n}")));
        }
        if !(v_max > 0.0) || !v_max.is_finite() {
            return Err(invalid(&name, "v_max", format!("must be > 0, got {v_max}")));
        }
        Ok(Diode {
            name,
            anode,
            cathode,
            i_s,
            n,
            v_t,
            v_max,
            g_min,
        })
    }

    fn nv_t(&self) -> f64 {
        self.n * self.v_t
    }

    /// `(I_d, g_d)` at a (possibly clamped) diode voltage.
    fn eval(&self, v_d: f64) -> (f64, f64) {
        let nv_t = self.nv_t();
        if v_d <= self.v_max {
            let exp = (v_d / nv_t).exp();
            let i = self.i_s * (exp - 1.0);
            let g = (self.i_s / nv_t) * exp;
            (i, g.max(self.g_min))
        } else {
            // Linear extrapolation beyond v_max using the slope there,
            // avoiding exp() overflow for pathological Newton overshoot.
            let exp_max = (self.v_max / nv_t).exp();
            let i_max = self.i_s * (exp_max - 1.0);
            let g_max = (self.i_s / nv_t) * exp_max;
            (i_max + g_max * (v_d - self.v_max), g_max.max(self.g_min))
        }
    }

    fn voltage(&self, x: &Vector, ctx: &StampContext) -> f64 {
        let vp = ctx.node_index(self.anode).map(|i| x[i]).unwrap_or(0.0);
        let vn = ctx.node_index(self.cathode).map(|i| x[i]).unwrap_or(0.0);
        vp - vn
    }

    /// Practical turn-on voltage used for event detection: the voltage at
    /// which the Shockley curve reaches 1 mA.
    fn turn_on_voltage(&self) -> f64 {
        self.nv_t() * (1e-3 / self.i_s).ln()
    }
}

impl Component for Diode {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.anode, self.cathode]
    }

    fn is_nonlinear(&self) -> bool {
        true
    }

    fn stamp_residual(&self, r: &mut Vector, x: &Vector, ctx: &StampContext, _t: f64) {
        let v_d = self.voltage(x, ctx);
        let (i, _g) = self.eval(v_d);
        if let Some(p) = ctx.node_index(self.anode) {
            r.add_at(p, i);
        }
        if let Some(nn) = ctx.node_index(self.cathode) {
            r.add_at(nn, -i);
        }
    }

    fn stamp_jacobian(&self, j: &mut Matrix, x: &Vector, ctx: &StampContext, _t: f64) {
        let v_d = self.voltage(x, ctx);
        let (_i, g) = self.eval(v_d);
        let p = ctx.node_index(self.anode);
        let nn = ctx.node_index(self.cathode);
        if let Some(i) = p {
            j.add_at(i, i, g);
        }
        if let Some(i) = nn {
            j.add_at(i, i, g);
        }
        if let (Some(i), Some(jn)) = (p, nn) {
            j.add_at(i, jn, -g);
            j.add_at(jn, i, -g);
        }
    }

    fn event_imminent(&self, x: &Vector, ctx: &StampContext) -> bool {
        let v_d = self.voltage(x, ctx);
        (v_d - self.turn_on_voltage()).abs() < 0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn rejects_non_positive_saturation_current() {
        assert!(Diode::with_params("D1", NodeId::new(1), NodeId::ground(), 0.0, 1.0, 0.025852, 0.8, 1e-12).is_err());
    }

    #[test]
    fn forward_bias_produces_positive_current_and_conductance() {
        let d = Diode::new("D1", NodeId::new(1), NodeId::ground()).unwrap();
        let (i, g) = d.eval(0.6);
        assert!(i > 0.0);
        assert!(g > 0.0);
    }

    #[test]
    fn reverse_bias_current_is_floored_by_gmin() {
        let d = Diode::new("D1", NodeId::new(1), NodeId::ground()).unwrap();
        let (i, g) = d.eval(-5.0);
        assert!(i < 0.0);
        assert!((i - (-1e-14)).abs() < 1e-15);
        assert_eq!(g, 1e-12);
    }

    #[test]
    fn clamps_above_vmax_without_overflow() {
        let d = Diode::new("D1", NodeId::new(1), NodeId::ground()).unwrap();
        let (i, _g) = d.eval(50.0);
        assert!(i.is_finite());
    }

    #[test]
    fn residual_and_jacobian_stamp_symmetric_pattern() {
        let d = Diode::new("D1", NodeId::new(1), NodeId::ground()).unwrap();
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0)].into_iter().collect();
        let branch_map = IndexMap::new();
        let ctx = StampContext::new(1, &node_map, &branch_map);
        let mut x = Vector::zeros(1);
        x.set(0, 0.6);
        let mut r = Vector::zeros(1);
        d.stamp_residual(&mut r, &x, &ctx, 0.0);
        let mut j = Matrix::zeros(1);
        d.stamp_jacobian(&mut j, &x, &ctx, 0.0);
        let (i_expected, g_expected) = d.eval(0.6);
        assert!((r.get(0) - i_expected).abs() < 1e-18);
        assert!((j.get(0, 0) - g_expected).abs() < 1e-18);
    }
}
