//! Capacitor companion model (§4.2.2).
//!
//! Exactly one `Capacitor` implementation, generalized over all four
//! integration methods via [`IntegrationMethod`] rather than the teacher's
//! three separate Backward-Euler/BDF2/"explicit state" copies (§9 Design
//! Notes: "this is a refactoring artifact, not a design").

use spicier_core::component::{Component, IntegrationMethod, StampContext};
use spicier_core::mna::MnaSystem;
use spicier_core::{NodeId, Vector};

use crate::error::{Result, invalid};

/// `C` dv/dt = i. Stamped as a Norton-equivalent conductance `G_eq` in
/// parallel with a current source `I_eq` between the two nodes. In DC
/// analysis a capacitor is open (skipped in stamping; see [`Component::prime_for_dc`]).
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub name: String,
    pub pos: NodeId,
    pub neg: NodeId,
    capacitance: f64,

    /// Accepted-step history: `(voltage, current)` pairs, most recent first.
    v_prev: f64,
    i_prev: f64,
    v_prev2: f64,
    /// Number of accepted-step history points available (capped at 2).
    history_len: usize,

    g_eq: f64,
    i_eq: f64,
    /// Backward-Euler-only companion, kept alongside whatever method is
    /// active so `local_truncation_error` has a lower-order Milne-device
    /// comparison point regardless of method (§4.5).
    g_be_compare: f64,
    i_eq_be_compare: f64,
}

impl Capacitor {
    pub fn new(name: impl Into<String>, pos: NodeId, neg: NodeId, capacitance: f64) -> Result<Self> {
        let name = name.into();
        if !(capacitance > 0.0) || !capacitance.is_finite() {
            return Err(invalid(&name, "capacitance", format!("must be > 0, got {capacitance}")));
        }
        Ok(Capacitor {
            name,
            pos,
            neg,
            capacitance,
            v_prev: 0.0,
            i_prev: 0.0,
            v_prev2: 0.0,
            history_len: 0,
            g_eq: 0.0,
            i_eq: 0.0,
            g_be_compare: 0.0,
            i_eq_be_compare: 0.0,
        })
    }

    /// Set the initial condition voltage (`ic=` parameter), before any step
    /// has been taken.
    pub fn set_initial_condition(&mut self, v0: f64) {
        self.v_prev = v0;
        self.v_prev2 = v0;
        self.i_prev = 0.0;
        self.history_len = 1;
    }

    fn voltage(&self, x: &Vector, ctx: &StampContext) -> f64 {
        let vp = ctx.node_index(self.pos).map(|i| x[i]).unwrap_or(0.0);
        let vn = ctx.node_index(self.neg).map(|i| x[i]).unwrap_or(0.0);
        vp - vn
    }
}

impl Component for Capacitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.pos, self.neg]
    }

    fn is_reactive(&self) -> bool {
        true
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        if self.g_eq == 0.0 && self.i_eq == 0.0 {
            // DC: primed as open circuit, nothing to stamp.
            return;
        }
        let pos = ctx.node_index(self.pos);
        let neg = ctx.node_index(self.neg);
        mna.stamp_conductance(pos, neg, self.g_eq);
        mna.stamp_current_source(neg, pos, self.i_eq);
    }

    fn prime_for_dc(&mut self) {
        self.g_eq = 0.0;
        self.i_eq = 0.0;
    }

    fn update_companion(&mut self, h: f64, method: IntegrationMethod) {
        let g_be = self.capacitance / h;
        let i_be = g_be * self.v_prev;
        self.g_be_compare = g_be;
        self.i_eq_be_compare = i_be;

        let (g, i) = match method {
            IntegrationMethod::BackwardEuler => (g_be, i_be),
            IntegrationMethod::Trapezoidal => {
                if self.history_len == 0 {
                    (g_be, i_be)
                } else {
                    let g = 2.0 * self.capacitance / h;
                    (g, g * self.v_prev + self.i_prev)
                }
            }
            IntegrationMethod::Bdf2 => {
                if self.history_len < 2 {
                    (g_be, i_be)
                } else {
                    let g = 1.5 * self.capacitance / h;
                    let i = (2.0 * self.capacitance / h) * self.v_prev
                        - (0.5 * self.capacitance / h) * self.v_prev2;
                    (g, i)
                }
            }
            IntegrationMethod::GeneralizedAlpha { rho_inf } => {
                if self.history_len == 0 {
                    (g_be, i_be)
                } else {
                    // theta-blend between Backward Euler (rho_inf=0, fully
                    // L-stable) and Trapezoidal (rho_inf=1, no damping);
                    // see DESIGN.md for the rationale behind this
                    // simplification.
                    let theta = (1.0 - rho_inf).clamp(0.0, 1.0);
                    let g_trap = 2.0 * self.capacitance / h;
                    let i_trap = g_trap * self.v_prev + self.i_prev;
                    (theta * g_be + (1.0 - theta) * g_trap, theta * i_be + (1.0 - theta) * i_trap)
                }
            }
        };
        self.g_eq = g;
        self.i_eq = i;
    }

    fn commit_history(&mut self, x: &Vector, ctx: &StampContext) {
        let v_new = self.voltage(x, ctx);
        let i_new = self.g_eq * v_new - self.i_eq;
        self.v_prev2 = self.v_prev;
        self.v_prev = v_new;
        self.i_prev = i_new;
        self.history_len = (self.history_len + 1).min(2);
    }

    fn seed_history(&mut self, voltage: f64, _current: f64) {
        self.v_prev = voltage;
        self.v_prev2 = voltage;
        self.i_prev = 0.0;
        self.history_len = 1;
    }

    fn local_truncation_error(&self, _h: f64) -> f64 {
        let i_method = self.g_eq * self.v_prev - self.i_eq;
        let i_be = self.g_be_compare * self.v_prev - self.i_eq_be_compare;
        (i_method - i_be).abs() / 3.0
    }
}
