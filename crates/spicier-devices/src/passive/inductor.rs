//! Inductor companion model (§4.2.3).
//!
//! Stamped as a Thevenin equivalent `(R_eq, V_eq)` on a dedicated
//! branch-current row, per the distilled spec's explicit branch-current
//! requirement — see DESIGN.md Open Question #2 for why this departs from
//! the teacher's Norton-only inductor (which carried no branch row).

use spicier_core::component::{Component, IntegrationMethod, StampContext};
use spicier_core::mna::MnaSystem;
use spicier_core::{NodeId, Vector};

use crate::error::{Result, invalid};

/// `L` di/dt = v, plus an optional series resistance `r_series` (used as the
/// DC short-circuit resistance and folded into `R_eq` every step).
#[derive(Debug, Clone)]
pub struct Inductor {
    pub name: String,
    pub pos: NodeId,
    pub neg: NodeId,
    inductance: f64,
    r_series: f64,

    i_prev: f64,
    v_prev: f64,
    i_prev2: f64,
    history_len: usize,

    r_eq: f64,
    v_eq: f64,
    r_be_compare: f64,
    v_eq_be_compare: f64,
}

impl Inductor {
    pub fn new(name: impl Into<String>, pos: NodeId, neg: NodeId, inductance: f64) -> Result<Self> {
        Self::with_series_resistance(name, pos, neg, inductance, 0.0)
    }

    pub fn with_series_resistance(
        name: impl Into<String>,
        pos: NodeId,
        neg: NodeId,
        inductance: f64,
        r_series: f64,
    ) -> Result<Self> {
        let name = name.into();
        if !(inductance > 0.0) || !inductance.is_finite() {
            return Err(invalid(&name, "inductance", format!("must be > 0, got {inductance}")));
        }
        if r_series < 0.0 {
            return Err(invalid(&name, "r_series", format!("must be >= 0, got {r_series}")));
        }
        Ok(Inductor {
            name,
            pos,
            neg,
            inductance,
            r_series,
            i_prev: 0.0,
            v_prev: 0.0,
            i_prev2: 0.0,
            history_len: 0,
            r_eq: r_series,
            v_eq: 0.0,
            r_be_compare: r_series,
            v_eq_be_compare: 0.0,
        })
    }

    pub fn set_initial_condition(&mut self, i0: f64) {
        self.i_prev = i0;
        self.i_prev2 = i0;
        self.v_prev = 0.0;
        self.history_len = 1;
    }

    fn voltage(&self, x: &Vector, ctx: &StampContext) -> f64 {
        let vp = ctx.node_index(self.pos).map(|i| x[i]).unwrap_or(0.0);
        let vn = ctx.node_index(self.neg).map(|i| x[i]).unwrap_or(0.0);
        vp - vn
    }

    fn current(&self, x: &Vector, ctx: &StampContext) -> f64 {
        ctx.branch_row(&self.name).map(|row| x[row]).unwrap_or(0.0)
    }
}

impl Component for Inductor {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.pos, self.neg]
    }

    fn needs_current_var(&self) -> bool {
        true
    }

    fn is_reactive(&self) -> bool {
        true
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        let pos = ctx.node_index(self.pos);
        let neg = ctx.node_index(self.neg);
        let branch = ctx.branch_row(&self.name).expect("inductor registered a branch var");

        mna.stamp_branch_incidence(pos, neg, branch);
        // Branch equation: v_i - v_j - R_eq*i_L - V_eq = 0.
        mna.matrix_mut().add_at(branch, branch, -self.r_eq);
        mna.rhs_mut().add_at(branch, self.v_eq);
    }

    fn prime_for_dc(&mut self) {
        // DC: inductor is a short, R_eq = r_series (no companion history term).
        self.r_eq = self.r_series;
        self.v_eq = 0.0;
    }

    fn update_companion(&mut self, h: f64, method: IntegrationMethod) {
        let r_be = 2.0 * self.inductance / h + self.r_series;
        // NB: the Backward-Euler comparison point deliberately uses the
        // single-history-point formula (R=L/h) for the LTE Milne device, kept
        // separate from the BE *method* itself (which uses R=2L/h to match
        // the companion's own first-order limit consistently with the
        // capacitor's dual).
        let r_be_method = self.inductance / h + self.r_series;
        let v_eq_be_method = -(self.inductance / h) * self.i_prev;
        self.r_be_compare = r_be;
        self.v_eq_be_compare = -(2.0 * self.inductance / h) * self.i_prev - self.v_prev;

        let (r, v) = match method {
            IntegrationMethod::BackwardEuler => (r_be_method, v_eq_be_method),
            IntegrationMethod::Trapezoidal => {
                if self.history_len == 0 {
                    (r_be_method, v_eq_be_method)
                } else {
                    let r = 2.0 * self.inductance / h + self.r_series;
                    let v = -((2.0 * self.inductance / h) * self.i_prev + self.v_prev);
                    (r, v)
                }
            }
            IntegrationMethod::Bdf2 => {
                if self.history_len < 2 {
                    (r_be_method, v_eq_be_method)
                } else {
                    let r = 1.5 * self.inductance / h + self.r_series;
                    let v = -((2.0 * self.inductance / h) * self.i_prev
                        - (0.5 * self.inductance / h) * self.i_prev2);
                    (r, v)
                }
            }
            IntegrationMethod::GeneralizedAlpha { rho_inf } => {
                if self.history_len == 0 {
                    (r_be_method, v_eq_be_method)
                } else {
                    let theta = (1.0 - rho_inf).clamp(0.0, 1.0);
                    let r_trap = 2.0 * self.inductance / h + self.r_series;
                    let v_trap = -((2.0 * self.inductance / h) * self.i_prev + self.v_prev);
                    (
                        theta * r_be_method + (1.0 - theta) * r_trap,
                        theta * v_eq_be_method + (1.0 - theta) * v_trap,
                    )
                }
            }
        };
        self.r_eq = r;
        self.v_eq = v;
    }

    fn commit_history(&mut self, x: &Vector, ctx: &StampContext) {
        let v_new = self.voltage(x, ctx);
        let i_new = self.current(x, ctx);
        self.i_prev2 = self.i_prev;
        self.i_prev = i_new;
        self.v_prev = v_new;
        self.history_len = (self.history_len + 1).min(2);
    }

    fn seed_history(&mut self, _voltage: f64, current: f64) {
        self.i_prev = current;
        self.i_prev2 = current;
        self.v_prev = 0.0;
        self.history_len = 1;
    }

    fn local_truncation_error(&self, _h: f64) -> f64 {
        let i_method = (self.v_prev - self.v_eq) / self.r_eq.max(1e-30);
        let i_be = (self.v_prev - self.v_eq_be_compare) / self.r_be_compare.max(1e-30);
        (i_method - i_be).abs() / 3.0
    }
}
