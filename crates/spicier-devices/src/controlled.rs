//! Controlled source device models: VCVS (E), VCCS (G), CCCS (F), CCVS (H).
//!
//! Rebuilt against the shared `spicier_core::Component` trait rather than the
//! teacher's separate `Stamp`/`Element`/`Stamper` triad and raw
//! `current_index: usize` wiring — branch rows are resolved by component
//! name through `StampContext` like every other device, so a CCCS/CCVS's
//! controlling source is referenced by name instead of a hand-threaded index.

use spicier_core::component::{Component, StampContext};
use spicier_core::mna::MnaSystem;
use spicier_core::NodeId;

// ────────────────────── VCVS (E element) ──────────────────────

/// Voltage-controlled voltage source: `V(out+, out-) = gain * V(ctrl+, ctrl-)`.
#[derive(Debug, Clone)]
pub struct Vcvs {
    pub name: String,
    pub out_pos: NodeId,
    pub out_neg: NodeId,
    pub ctrl_pos: NodeId,
    pub ctrl_neg: NodeId,
    pub gain: f64,
}

impl Vcvs {
    pub fn new(
        name: impl Into<String>,
        out_pos: NodeId,
        out_neg: NodeId,
        ctrl_pos: NodeId,
        ctrl_neg: NodeId,
        gain: f64,
    ) -> Self {
        Vcvs {
            name: name.into(),
            out_pos,
            out_neg,
            ctrl_pos,
            ctrl_neg,
            gain,
        }
    }
}

impl Component for Vcvs {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.out_pos, self.out_neg, self.ctrl_pos, self.ctrl_neg]
    }

    fn needs_current_var(&self) -> bool {
        true
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        let op = ctx.node_index(self.out_pos);
        let on = ctx.node_index(self.out_neg);
        let cp = ctx.node_index(self.ctrl_pos);
        let cn = ctx.node_index(self.ctrl_neg);
        let br = ctx.branch_row(&self.name).expect("vcvs registered a branch var");

        mna.stamp_branch_incidence(op, on, br);
        if let Some(i) = cp {
            mna.matrix_mut().add_at(br, i, -self.gain);
        }
        if let Some(i) = cn {
            mna.matrix_mut().add_at(br, i, self.gain);
        }
    }
}

// ────────────────────── VCCS (G element) ──────────────────────

/// Voltage-controlled current source: `I(out+ -> out-) = gm * V(ctrl+, ctrl-)`.
#[derive(Debug, Clone)]
pub struct Vccs {
    pub name: String,
    pub out_pos: NodeId,
    pub out_neg: NodeId,
    pub ctrl_pos: NodeId,
    pub ctrl_neg: NodeId,
    pub gm: f64,
}

impl Vccs {
    pub fn new(
        name: impl Into<String>,
        out_pos: NodeId,
        out_neg: NodeId,
        ctrl_pos: NodeId,
        ctrl_neg: NodeId,
        gm: f64,
    ) -> Self {
        Vccs {
            name: name.into(),
            out_pos,
            out_neg,
            ctrl_pos,
            ctrl_neg,
            gm,
        }
    }
}

impl Component for Vccs {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.out_pos, self.out_neg, self.ctrl_pos, self.ctrl_neg]
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        let op = ctx.node_index(self.out_pos);
        let on = ctx.node_index(self.out_neg);
        let cp = ctx.node_index(self.ctrl_pos);
        let cn = ctx.node_index(self.ctrl_neg);

        // Current entering out_pos goes to the RHS in the KCL row, so the
        // matrix-side (LHS) coefficient carries the opposite sign.
        if let Some(i) = op {
            if let Some(j) = cp {
                mna.matrix_mut().add_at(i, j, -self.gm);
            }
            if let Some(j) = cn {
                mna.matrix_mut().add_at(i, j, self.gm);
            }
        }
        if let Some(i) = on {
            if let Some(j) = cp {
                mna.matrix_mut().add_at(i, j, self.gm);
            }
            if let Some(j) = cn {
                mna.matrix_mut().add_at(i, j, -self.gm);
            }
        }
    }
}

// ────────────────────── CCCS (F element) ──────────────────────

/// Current-controlled current source: `I(out+ -> out-) = gain * I(control_source)`.
///
/// `control_source` names a branch-current-carrying device (a voltage
/// source, or another element with `needs_current_var() == true`) whose
/// branch row is read directly, exactly as the teacher's CCCS referenced a
/// raw vsource branch index.
#[derive(Debug, Clone)]
pub struct Cccs {
    pub name: String,
    pub out_pos: NodeId,
    pub out_neg: NodeId,
    pub control_source: String,
    pub gain: f64,
}

impl Cccs {
    pub fn new(
        name: impl Into<String>,
        out_pos: NodeId,
        out_neg: NodeId,
        control_source: impl Into<String>,
        gain: f64,
    ) -> Self {
        Cccs {
            name: name.into(),
            out_pos,
            out_neg,
            control_source: control_source.into(),
            gain,
        }
    }
}

impl Component for Cccs {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.out_pos, self.out_neg]
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        let op = ctx.node_index(self.out_pos);
        let on = ctx.node_index(self.out_neg);
        let br = ctx
            .branch_row(&self.control_source)
            .expect("cccs control_source must name a branch-current device");

        if let Some(i) = op {
            mna.matrix_mut().add_at(i, br, self.gain);
        }
        if let Some(i) = on {
            mna.matrix_mut().add_at(i, br, -self.gain);
        }
    }
}

// ────────────────────── CCVS (H element) ──────────────────────

/// Current-controlled voltage source: `V(out+, out-) = gain * I(control_source)`.
#[derive(Debug, Clone)]
pub struct Ccvs {
    pub name: String,
    pub out_pos: NodeId,
    pub out_neg: NodeId,
    pub control_source: String,
    pub gain: f64,
}

impl Ccvs {
    pub fn new(
        name: impl Into<String>,
        out_pos: NodeId,
        out_neg: NodeId,
        control_source: impl Into<String>,
        gain: f64,
    ) -> Self {
        Ccvs {
            name: name.into(),
            out_pos,
            out_neg,
            control_source: control_source.into(),
            gain,
        }
    }
}

impl Component for Ccvs {
    fn name(&self) -> &str {
        &self.name
    }

    fn nodes(&self) -> Vec<NodeId> {
        vec![self.out_pos, self.out_neg]
    }

    fn needs_current_var(&self) -> bool {
        true
    }

    fn stamp(&self, mna: &mut MnaSystem, ctx: &StampContext, _t: f64) {
        let op = ctx.node_index(self.out_pos);
        let on = ctx.node_index(self.out_neg);
        let br = ctx.branch_row(&self.name).expect("ccvs registered a branch var");
        let ctrl_br = ctx
            .branch_row(&self.control_source)
            .expect("ccvs control_source must name a branch-current device");

        mna.stamp_branch_incidence(op, on, br);
        mna.matrix_mut().add_at(br, ctrl_br, -self.gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn ctx_for<'a>(node_map: &'a IndexMap<NodeId, usize>, branch_map: &'a IndexMap<String, usize>) -> StampContext<'a> {
        StampContext::new(node_map.len(), node_map, branch_map)
    }

    #[test]
    fn vcvs_stamps_branch_coupling_and_gain() {
        let e = Vcvs::new("E1", NodeId::new(1), NodeId::ground(), NodeId::new(2), NodeId::ground(), 2.0);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0), (NodeId::new(2), 1)].into_iter().collect();
        let branch_map: IndexMap<String, usize> = [("E1".to_string(), 0)].into_iter().collect();
        let ctx = ctx_for(&node_map, &branch_map);
        let mut mna = MnaSystem::new(2, 1);
        e.stamp(&mut mna, &ctx, 0.0);

        assert_eq!(mna.matrix().get(0, 2), 1.0);
        assert_eq!(mna.matrix().get(2, 0), 1.0);
        assert_eq!(mna.matrix().get(2, 1), -2.0);
    }

    #[test]
    fn vccs_stamps_transconductance() {
        let g = Vccs::new("G1", NodeId::new(1), NodeId::ground(), NodeId::new(2), NodeId::ground(), 0.001);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(1), 0), (NodeId::new(2), 1)].into_iter().collect();
        let branch_map = IndexMap::new();
        let ctx = ctx_for(&node_map, &branch_map);
        let mut mna = MnaSystem::new(2, 0);
        g.stamp(&mut mna, &ctx, 0.0);

        assert!((mna.matrix().get(0, 1) - (-0.001)).abs() < 1e-15);
    }

    #[test]
    fn cccs_mirrors_control_branch() {
        let f = Cccs::new("F1", NodeId::new(2), NodeId::ground(), "V1", 3.0);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(2), 1)].into_iter().collect();
        let branch_map: IndexMap<String, usize> = [("V1".to_string(), 0)].into_iter().collect();
        let ctx = StampContext::new(2, &node_map, &branch_map);
        let mut mna = MnaSystem::new(2, 1);
        f.stamp(&mut mna, &ctx, 0.0);

        assert_eq!(mna.matrix().get(1, 2), 3.0);
    }

    #[test]
    fn ccvs_stamps_branch_and_control_coupling() {
        let h = Ccvs::new("H1", NodeId::new(2), NodeId::ground(), "V1", 100.0);
        let node_map: IndexMap<NodeId, usize> = [(NodeId::new(2), 1)].into_iter().collect();
        let branch_map: IndexMap<String, usize> = [("H1".to_string(), 1), ("V1".to_string(), 0)].into_iter().collect();
        let ctx = StampContext::new(2, &node_map, &branch_map);
        let mut mna = MnaSystem::new(2, 2);
        h.stamp(&mut mna, &ctx, 0.0);

        assert_eq!(mna.matrix().get(1, 3), 1.0);
        assert_eq!(mna.matrix().get(3, 1), 1.0);
        assert_eq!(mna.matrix().get(3, 2), -100.0);
    }
}
