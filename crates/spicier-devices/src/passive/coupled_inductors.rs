//! Multi-winding coupled inductors / transformer (§4.2.4).
//!
//! Modeled as one `Component` owning `N` windings plus a symmetric coupling
//! matrix, rather than `N` independent `Inductor`s referencing each other —
//! per §9 Design Notes, mutual inductances live in a table the assembler
//! (here, this component itself) indexes by branch index only, never by
//! holding references between sibling components across the step loop.

use spicier_core::component::{Component, IntegrationMethod, StampContext};
use spicier_core::mna::MnaSystem;
use spicier_core::{NodeId, Vector};

use crate::error::{Result, invalid};

/// One winding of a coupled-inductor group: a node pair and a self-inductance.
/// The first node (`pos`) is the dotted terminal per the winding-order
/// convention (DESIGN.md Open Question #3).
#[derive(Debug, Clone, Copy)]
pub struct Winding {
    pub pos: NodeId,
    pub neg: NodeId,
    pub inductance: f64,
}

#[derive(Debug, Clone)]
struct WindingState {
    i_prev: f64,
    v_prev: f64,
    i_prev2: f64,
    history_len: usize,
    r_eq: f64,
    v_eq: f64,
    r_be_compare: f64,
    v_eq_be_compare: f64,
}

impl WindingState {
    fn new() -> Self {
        WindingState {
            i_prev: 0.0,
            v_prev: 0.0,
            i_prev2: 0.0,
            history_len: 0,
            r_eq: 0.0,
            v_eq: 0.0,
            r_be_compare: 0.0,
            v_eq_be_compare: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoupledInductors {
    pub name: String,
    windings: Vec<Winding>,
    /// Symmetric coupling coefficients, `k[i][j] in [-1, 1]`, diagonal forced to 1.
    k: Vec<Vec<f64>>,
    state: Vec<WindingState>,
    /// `M_ij / h` cached by `update_companion`, used by both the matrix
    /// coupling term and the history-dependent RHS term (§4.2.4).
    m_over_h: Vec<Vec<f64>>,
}

impl CoupledInductors {
    /// Build a coupled-inductor group with the default `k = 0.99` pairwise
    /// coupling the spec calls for when the user doesn't specify a matrix.
    pub fn new(name: impl Into<String>, windings: Vec<Winding>) -> Result<Self> {
        let n = windings.len();
        let default_k = vec![vec![0.99; n]; n];
        Self::with_coupling_matrix(name, windings, default_k)
    }

    pub fn with_coupling_matrix(
        name: impl Into<String>,
        windings: Vec<Winding>,
        mut k: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        let n = windings.len();
        if n < 2 {
            return Err(invalid(&name, "windings", "coupled inductors need at least 2 windings"));
        }
        if k.len() != n || k.iter().any(|row| row.len() != n) {
            return Err(invalid(&name, "k", "coupling matrix must be N x N"));
        }
        for w in &windings {
            if !(w.inductance > 0.0) || !w.inductance.is_finite() {
                return Err(invalid(&name, "inductance", format!("must be > 0, got {}", w.inductance)));
            }
        }
        for i in 0..n {
            k[i][i] = 1.0; // diagonal forced to 1 per spec
            for j in 0..n {
                if !(-1.0..=1.0).contains(&k[i][j]) {
                    return Err(invalid(&name, "k", format!("coupling k[{i}][{j}]={} out of [-1,1]", k[i][j])));
                }
            }
        }
        let state = (0..n).map(|_| WindingState::new()).collect();
        let m_over_h = vec![vec![0.0; n]; n];
        Ok(CoupledInductors {
            name,
            windings,
            k,
            state,
            m_over_h,
        })
    }

    pub fn num_windings(&self) -> usize {
        self.windings.len()
    }

    fn mutual(&self, i: usize, j: usize) -> f64 {
        self.k[i][j] * (self.windings[i].inductance * self.windings[j].inductance).sqrt()
    }

    pub fn set_initial_condition(&mut self, winding: usize, i0: f64) {
        let s = &mut self.state[winding];
        s.i_prev = i0;
        s.i_prev2 = i0;
        s.history_len = 1;
    }
}

impl Component for CoupledInductors {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.windings.iter().flat_map(|w| [w.pos, w.neg]).collect()
    }

    fn num_current_vars(&self) -> usize {
        self.windings.len()
    }

    fn needs_current_var(&self) -> bool {
        true
    }

    fn is_reactive(&self) -> bool {
        true
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        let n = self.windings.len();
        for i in 0..n {
            let w = self.windings[i];
            let row = ctx
                .branch_row_at(&self.name, i)
                .expect("coupled inductor registered its branch vars");
            mna.stamp_branch_incidence(ctx.node_index(w.pos), ctx.node_index(w.neg), row);
            mna.matrix_mut().add_at(row, row, -self.state[i].r_eq);
            mna.rhs_mut().add_at(row, self.state[i].v_eq);

            for p in 0..n {
                if p == i {
                    continue;
                }
                let row_p = ctx.branch_row_at(&self.name, p).unwrap();
                mna.matrix_mut().add_at(row, row_p, -self.m_over_h[i][p]);
                mna.rhs_mut().add_at(row, self.m_over_h[i][p] * self.state[p].i_prev);
            }
        }
    }

    fn prime_for_dc(&mut self) {
        for s in &mut self.state {
            s.r_eq = 0.0;
            s.v_eq = 0.0;
        }
        for row in &mut self.m_over_h {
            row.fill(0.0);
        }
    }

    fn update_companion(&mut self, h: f64, method: IntegrationMethod) {
        let n = self.windings.len();
        for i in 0..n {
            let l = self.windings[i].inductance;
            let s = &self.state[i];
            let r_be = l / h;
            let v_be = -r_be * s.i_prev;
            let (r, v) = match method {
                IntegrationMethod::BackwardEuler => (r_be, v_be),
                IntegrationMethod::Trapezoidal => {
                    if s.history_len == 0 {
                        (r_be, v_be)
                    } else {
                        (2.0 * l / h, -((2.0 * l / h) * s.i_prev + s.v_prev))
                    }
                }
                IntegrationMethod::Bdf2 => {
                    if s.history_len < 2 {
                        (r_be, v_be)
                    } else {
                        (
                            1.5 * l / h,
                            -((2.0 * l / h) * s.i_prev - (0.5 * l / h) * s.i_prev2),
                        )
                    }
                }
                IntegrationMethod::GeneralizedAlpha { rho_inf } => {
                    if s.history_len == 0 {
                        (r_be, v_be)
                    } else {
                        let theta = (1.0 - rho_inf).clamp(0.0, 1.0);
                        let r_trap = 2.0 * l / h;
                        let v_trap = -((2.0 * l / h) * s.i_prev + s.v_prev);
                        (theta * r_be + (1.0 - theta) * r_trap, theta * v_be + (1.0 - theta) * v_trap)
                    }
                }
            };
            self.state[i].r_eq = r;
            self.state[i].v_eq = v;
            self.state[i].r_be_compare = r_be;
            self.state[i].v_eq_be_compare = v_be;
        }

        for i in 0..n {
            for p in 0..n {
                self.m_over_h[i][p] = if i == p { 0.0 } else { self.mutual(i, p) / h };
            }
        }
    }

    fn commit_history(&mut self, x: &Vector, ctx: &StampContext) {
        for (i, w) in self.windings.iter().enumerate() {
            let vp = ctx.node_index(w.pos).map(|idx| x[idx]).unwrap_or(0.0);
            let vn = ctx.node_index(w.neg).map(|idx| x[idx]).unwrap_or(0.0);
            let v_new = vp - vn;
            let row = ctx.branch_row_at(&self.name, i).unwrap();
            let i_new = x[row];
            let s = &mut self.state[i];
            s.i_prev2 = s.i_prev;
            s.i_prev = i_new;
            s.v_prev = v_new;
            s.history_len = (s.history_len + 1).min(2);
        }
    }

    fn local_truncation_error(&self, _h: f64) -> f64 {
        // Per-winding Milne device, same comparison as a standalone inductor's
        // self-term (§4.5); mutual terms are first-order in both the method
        // and the BE comparison point so they cancel out of the difference.
        self.state
            .iter()
            .map(|s| {
                let i_method = (s.v_prev - s.v_eq) / s.r_eq.max(1e-30);
                let i_be = (s.v_prev - s.v_eq_be_compare) / s.r_be_compare.max(1e-30);
                (i_method - i_be).abs() / 3.0
            })
            .fold(0.0_f64, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn rejects_fewer_than_two_windings() {
        let w = Winding {
            pos: NodeId::new(1),
            neg: NodeId::ground(),
            inductance: 1e-3,
        };
        assert!(CoupledInductors::new("T1", vec![w]).is_err());
    }

    #[test]
    fn default_coupling_is_point99_with_forced_diagonal() {
        let w1 = Winding {
            pos: NodeId::new(1),
            neg: NodeId::ground(),
            inductance: 1e-3,
        };
        let w2 = Winding {
            pos: NodeId::new(2),
            neg: NodeId::ground(),
            inductance: 4e-3,
        };
        let t = CoupledInductors::new("T1", vec![w1, w2]).unwrap();
        assert_eq!(t.k[0][1], 0.99);
        assert_eq!(t.k[0][0], 1.0);
        assert_eq!(t.k[1][1], 1.0);
    }

    #[test]
    fn mutual_stamp_hits_cross_branch_columns() {
        let w1 = Winding {
            pos: NodeId::new(1),
            neg: NodeId::ground(),
            inductance: 1e-3,
        };
        let w2 = Winding {
            pos: NodeId::new(2),
            neg: NodeId::ground(),
            inductance: 4e-3,
        };
        let mut t = CoupledInductors::with_coupling_matrix("T1", vec![w1, w2], vec![vec![1.0, 0.999], vec![0.999, 1.0]]).unwrap();
        t.set_initial_condition(0, 0.0);
        t.set_initial_condition(1, 0.0);
        let h = 1e-6;
        t.update_companion(h, IntegrationMethod::BackwardEuler);

        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0), (NodeId::new(2), 1)].into_iter().collect();
        let branch_map: IndexMap<String, usize> = [("T1".to_string(), 0)].into_iter().collect();
        let ctx = StampContext::new(2, &node_map, &branch_map);
        let mut mna = MnaSystem::new(2, 2);
        t.stamp(&mut mna, &ctx, 0.0);

        let m = t.mutual(0, 1);
        // row for winding 0 is index 2 (num_nodes + 0), column for winding 1's branch is index 3.
        assert!((mna.matrix().get(2, 3) - (-m / h)).abs() < 1e-20);
        assert!((mna.matrix().get(3, 2) - (-m / h)).abs() < 1e-20);
    }
}
